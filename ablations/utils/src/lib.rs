//! 消融实验依赖的通用组件.

use ndarray::{s, Array3};

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 简单分隔线.
pub fn sep_to<W: std::io::Write>(mut w: W) -> std::io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 合成体数据及其真值标签.
#[derive(Clone, Debug)]
pub struct Phantom {
    /// 名称.
    pub name: &'static str,
    /// 体数据, 前景 +500, 背景 -500.
    pub volume: Array3<f32>,
    /// 真值, 前景为 1.
    pub truth: Array3<u8>,
}

impl Phantom {
    fn from_truth(name: &'static str, truth: Array3<u8>) -> Self {
        let volume = truth.mapv(|v| if v == 1 { 500.0 } else { -500.0 });
        Self {
            name,
            volume,
            truth,
        }
    }

    /// `n^3` 体数据中居中, 边长为 `side` 的立方体.
    pub fn cube(n: usize, side: usize) -> Self {
        assert!(side <= n);
        let lo = (n - side) / 2;
        let mut truth = Array3::<u8>::zeros((n, n, n));
        truth
            .slice_mut(s![lo..lo + side, lo..lo + side, lo..lo + side])
            .fill(1);
        Self::from_truth("cube", truth)
    }

    /// `n^3` 体数据中居中, 半径为 `r` 的球体.
    pub fn ball(n: usize, r: usize) -> Self {
        let c = (n / 2) as i64;
        let r2 = (r * r) as i64;
        let truth = Array3::from_shape_fn((n, n, n), |(z, y, x)| {
            let d = |v: usize| v as i64 - c;
            u8::from(d(x).pow(2) + d(y).pow(2) + d(z).pow(2) <= r2)
        });
        Self::from_truth("ball", truth)
    }

    /// 体数据中心.
    pub fn center(&self) -> ls_berry::Coord {
        let (z, y, x) = self.volume.dim();
        ls_berry::Coord::new((x / 2) as i32, (y / 2) as i32, (z / 2) as i32)
    }
}

/// 两个标签中前景 `fg` 的 Dice 系数. 二者均无前景时为 1.
pub fn dice(a: &Array3<u8>, b: &Array3<u8>, fg: u8) -> f64 {
    assert_eq!(a.dim(), b.dim());
    let (mut inter, mut total) = (0usize, 0usize);
    ndarray::Zip::from(a).and(b).for_each(|&x, &y| {
        let (x, y) = (x == fg, y == fg);
        total += x as usize + y as usize;
        inter += (x && y) as usize;
    });
    if total == 0 {
        1.0
    } else {
        2.0 * inter as f64 / total as f64
    }
}
