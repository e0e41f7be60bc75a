mod common;

use common::{assert_consistent, cube_phantom, dice, init_logger};
use ls_berry::{Coord, LevelSet3d, LevelSetConfig, SmoothingSpec, Velocity};
use ndarray::{s, Array3};

const N: usize = 64;
const CUBE_VOXELS: usize = 24 * 24 * 24;

/// 64^3, 背景 -500, 立方体 `[20, 44)^3` 为 +500.
fn phantom() -> Array3<f32> {
    cube_phantom(N, 20, 44, 500.0, -500.0)
}

fn truth() -> Array3<u8> {
    let mut label = Array3::<u8>::zeros((N, N, N));
    label.slice_mut(s![20..44, 20..44, 20..44]).fill(1);
    label
}

/// 中心半径为 8 的球体种子, 并以均值分离填充速度场.
fn seeded(vol: &Array3<f32>, config: LevelSetConfig) -> LevelSet3d<'_, f32> {
    let mut ls = LevelSet3d::prepare_volumes(vol.view(), config).unwrap();
    ls.initial_sphere(8, Coord::new(32, 32, 32)).unwrap();
    let stats = ls.compute_mean().unwrap();
    assert_eq!(stats.foreground_mean, 500.0);
    assert!(stats.background_mean < 0.0);
    ls.compute_vf_mean(1.0, 1.0).unwrap();
    ls
}

#[test]
fn test_sphere_in_cube() {
    init_logger();
    let vol = phantom();
    let mut ls = seeded(&vol, LevelSetConfig::default());

    let steps = ls.automatic_evolution(200).unwrap();
    assert!(steps < 200, "no early stop: {steps}");

    let fg = ls.phi().count_foreground() as f64;
    let expected = CUBE_VOXELS as f64;
    assert!((fg - expected).abs() <= 0.05 * expected, "foreground = {fg}");
    assert!(dice(&ls.phi().to_label(1, 0), &truth()) > 0.95);
    assert_consistent(&ls);
}

#[test]
fn test_consistent_after_every_step() {
    init_logger();
    let vol = phantom();
    let mut ls = seeded(&vol, LevelSetConfig::default());

    let mut steps = 0;
    while !ls.stopping_criterion() {
        assert!(steps < 200);
        ls.manual_evolution(1).unwrap();
        assert_consistent(&ls);
        steps += 1;
    }
    assert!(steps > 0);
}

/// 收敛后再演化一步, 两条窄带的长度几乎不变.
#[test]
fn test_fixed_point() {
    init_logger();
    let vol = phantom();
    let mut ls = seeded(&vol, LevelSetConfig::default());
    ls.automatic_evolution(200).unwrap();

    let (n_in, n_out) = (ls.inner_band().len(), ls.outer_band().len());
    ls.manual_evolution(1).unwrap();
    let (m_in, m_out) = (ls.inner_band().len(), ls.outer_band().len());

    let rel = |a: usize, b: usize| (a as f64 - b as f64).abs() / a.max(1) as f64;
    assert!(rel(n_in, m_in) < 0.002);
    assert!(rel(n_out, m_out) < 0.002);
    assert_consistent(&ls);
}

#[test]
fn test_with_smoothing() {
    init_logger();
    let vol = phantom();
    let cfg = LevelSetConfig::default().with_smoothing(SmoothingSpec::new(5, 3, 1.0));
    let mut ls = seeded(&vol, cfg);

    let steps = ls.automatic_evolution(200).unwrap();
    assert!(steps < 200, "no early stop: {steps}");
    let fg = ls.phi().count_foreground() as f64;
    let expected = CUBE_VOXELS as f64;
    assert!((fg - expected).abs() <= 0.05 * expected, "foreground = {fg}");
    assert_consistent(&ls);
}

/// 不同线程数下结果一致.
#[test]
fn test_thread_count_independent() {
    init_logger();
    let vol = phantom();
    let run = |threads: usize| {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap();
        pool.install(|| {
            let mut ls = seeded(&vol, LevelSetConfig::default());
            let steps = ls.automatic_evolution(200).unwrap();
            (steps, ls.phi().to_label(1, 0))
        })
    };

    let (s1, l1) = run(1);
    let (s4, l4) = run(num_cpus::get().clamp(2, 4));
    assert_eq!(s1, s4);
    assert_eq!(l1, l4);
}

/// 惰性分类器: 立方体内为前景, 其余为背景; 立方体内部远离种子的部分体素无法判定,
/// 需由 26-邻域表决补全.
fn lazy_classifier(c: Coord) -> Velocity {
    let inside = |lo: i32, hi: i32| [c.x, c.y, c.z].iter().all(|v| (lo..hi).contains(v));
    let far_from_seed = c.distance_squared(&Coord::new(32, 32, 32)) > 100;
    if inside(22, 42) && far_from_seed && (c.x + c.y + c.z) % 3 == 0 {
        Velocity::Unknown
    } else {
        Velocity::from_foreground(inside(20, 44))
    }
}

#[test]
fn test_lazy_classifier() {
    init_logger();
    let vol = phantom();
    let run = |threads: usize| {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap();
        pool.install(|| {
            let mut ls =
                LevelSet3d::prepare_volumes(vol.view(), LevelSetConfig::default()).unwrap();
            ls.initial_sphere(8, Coord::new(32, 32, 32)).unwrap();
            ls.set_vf_custom_fn(lazy_classifier);
            let steps = ls.automatic_evolution(200).unwrap();
            assert!(steps < 200);
            assert_consistent(&ls);
            // 只有被访问过的体素才会被分类.
            assert!(ls.velocity().count(Velocity::Unknown) > 0);
            (steps, ls.phi().to_label(1, 0))
        })
    };

    let (s1, l1) = run(1);
    assert_eq!(l1, truth());
    let (s4, l4) = run(num_cpus::get().clamp(2, 4));
    assert_eq!(s1, s4);
    assert_eq!(l1, l4);
}

#[test]
fn test_region_seed_shrinks() {
    init_logger();
    let vol = phantom();
    let mut seed = Array3::<u8>::zeros((N, N, N));
    seed.slice_mut(s![10..54, 10..54, 10..54]).fill(2);

    let mut ls = LevelSet3d::prepare_volumes(vol.view(), LevelSetConfig::default()).unwrap();
    ls.initialize_from_region(seed.view(), 2).unwrap();
    ls.set_vf_from_labels(truth().view(), false).unwrap();
    assert_consistent(&ls);

    ls.automatic_evolution(200).unwrap();
    assert_eq!(ls.phi().count_foreground(), CUBE_VOXELS);
    assert_eq!(ls.phi().to_label(1, 0), truth());
}
