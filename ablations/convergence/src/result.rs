//! 实验结果.

use itertools::Itertools;
use std::io::{self, Write};
use std::time::Duration;

/// 一次运行的统计.
#[derive(Clone, Debug)]
pub struct Profile {
    /// 线程池大小.
    pub threads: usize,
    /// 实际演化步数.
    pub iterations: usize,
    /// 与真值的 Dice 系数.
    pub dice: f64,
    /// 从准备到演化结束的总时间.
    pub elapsed: Duration,
}

/// 将 `p` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Profile `{name}` ({} threads):", p.threads)?;
    writeln!(w, "{S4}Iterations: {}", p.iterations)?;
    writeln!(w, "{S4}Dice: {:.6}", p.dice)?;
    write!(w, "{S4}Total machine time: {} us", p.elapsed.as_micros())?;
    Ok(())
}

/// 消融实验最终结果.
#[derive(Default)]
pub struct AblationResult {
    data: Vec<(&'static str, Profile)>,
}

impl AblationResult {
    pub fn push(&mut self, name: &'static str, p: Profile) {
        self.data.push((name, p));
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        let stdout = io::stdout();
        let mut w = stdout.lock();
        if let Err(e) = self.write_to(&mut w) {
            log::error!("cannot write results: {e}");
        }
    }

    fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        utils::sep_to(&mut *w)?;
        for (key, profile) in self.data.iter() {
            describe_into(key, profile, w)?;
            writeln!(w)?;
            utils::sep_to(&mut *w)?;
        }

        for name in self.diverging() {
            writeln!(w, "WARNING: `{name}` iterations differ across thread counts")?;
        }
        Ok(())
    }

    /// 不同线程数下步数不一致的体数据名称. 同名结果按运行顺序连续存放.
    fn diverging(&self) -> Vec<&'static str> {
        let groups = self.data.iter().group_by(|(name, _)| *name);
        let names = groups
            .into_iter()
            .filter_map(|(name, rows)| {
                let steps: Vec<usize> = rows.map(|(_, p)| p.iterations).collect();
                steps.windows(2).any(|w| w[0] != w[1]).then_some(name)
            })
            .collect();
        names
    }
}
