//! 收敛性消融实验: 在不同线程数下分割合成体数据, 统计迭代步数, Dice 与耗时.

mod result;
mod runner;

fn main() {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .env()
        .init();
    runner::run().analyze();
}
