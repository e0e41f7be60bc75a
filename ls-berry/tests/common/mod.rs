//! 集成测试的公共组件.

#![allow(dead_code)]

use ls_berry::LevelSet3d;
use ls_berry::PhiTag;
use ndarray::{s, Array3};
use std::collections::HashSet;

/// 初始化日志. 可重复调用.
pub fn init_logger() {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init();
}

/// 背景为 `bg`, 立方体 `[lo, hi)^3` 为 `fg` 的体数据.
pub fn cube_phantom(n: usize, lo: usize, hi: usize, fg: f32, bg: f32) -> Array3<f32> {
    let mut vol = Array3::from_elem((n, n, n), bg);
    vol.slice_mut(s![lo..hi, lo..hi, lo..hi]).fill(fg);
    vol
}

/// 两个标签体数据中值为 1 的区域的 Dice 系数.
pub fn dice(a: &Array3<u8>, b: &Array3<u8>) -> f64 {
    let (mut inter, mut na, mut nb) = (0usize, 0usize, 0usize);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x == 1, *y == 1);
        na += x as usize;
        nb += y as usize;
        inter += (x && y) as usize;
    }
    if na + nb == 0 {
        return 1.0;
    }
    2.0 * inter as f64 / (na + nb) as f64
}

/// 检查 phi 状态与窄带成员一致, 且窄带无重复.
pub fn assert_consistent(ls: &LevelSet3d<'_, f32>) {
    for (band, tag) in [
        (ls.inner_band(), PhiTag::InnerBoundary),
        (ls.outer_band(), PhiTag::OuterBoundary),
    ] {
        let set: HashSet<_> = band.iter().copied().collect();
        assert_eq!(set.len(), band.len(), "duplicated band entries");
        assert!(band.iter().all(|c| ls.phi().tag(*c) == Some(tag)));
        assert_eq!(ls.phi().count(tag), band.len());
    }
}
