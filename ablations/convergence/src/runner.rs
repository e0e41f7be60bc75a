//! 程序运行函数.

use crate::result::{AblationResult, Profile};
use ls_berry::prelude::*;
use std::time::Instant;
use utils::{loader, Phantom};

const MAX_ITERATIONS: usize = 500;

/// 种子形状.
#[derive(Clone, Copy, Debug)]
enum Seed {
    /// 以体数据中心为球心的球体.
    Sphere(usize),
    /// 以体数据中心为中心的立方体.
    Cube(usize),
    /// 真值标签本身.
    Truth,
}

/// 在 `phantom` 上完整运行一次引擎.
fn segment(phantom: &Phantom, seed: Seed, threads: usize) -> LsResult<Profile> {
    let start = Instant::now();
    let mut ls = LevelSet3d::prepare_volumes(phantom.volume.view(), LevelSetConfig::default())?;
    match seed {
        Seed::Sphere(r) => ls.initial_sphere(r, phantom.center())?,
        Seed::Cube(side) => {
            let half = (side / 2) as i32;
            let c = phantom.center();
            let corner = Coord::new(c.x - half, c.y - half, c.z - half);
            ls.initial_cube(corner, side, side)?
        }
        Seed::Truth => ls.initialize_from_region(phantom.truth.view(), 1)?,
    }
    ls.compute_mean()?;
    ls.compute_vf_mean(1.0, 1.0)?;
    let iterations = ls.automatic_evolution(MAX_ITERATIONS)?;
    let elapsed = start.elapsed();

    let label = ls.phi().to_label(1, 0);
    Ok(Profile {
        threads,
        iterations,
        dice: utils::dice(&label, &phantom.truth, 1),
        elapsed,
    })
}

/// 线程数候选. 升序且去重.
fn thread_counts() -> Vec<usize> {
    let mut v = vec![1, 2, utils::cpus()];
    v.sort_unstable();
    v.dedup();
    v
}

/// 实际运行.
pub fn run() -> AblationResult {
    let mut cases = vec![
        (Phantom::cube(64, 24), Seed::Sphere(8)),
        (Phantom::ball(64, 20), Seed::Cube(8)),
    ];
    match loader::scan_and_label_from_env() {
        Some(Ok((scan, label))) => {
            let truth = label.data().mapv(|v| u8::from(v > 0));
            let phantom = Phantom {
                name: "nifti",
                volume: scan.data().to_owned(),
                truth,
            };
            cases.push((phantom, Seed::Truth));
        }
        Some(Err(e)) => log::warn!("skip nifti case: {e}"),
        None => {}
    }

    utils::sep();
    println!("Running ablation studies...");
    let mut result = AblationResult::default();
    for (phantom, seed) in cases.iter() {
        for threads in thread_counts() {
            let pool = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool,
                Err(e) => {
                    log::warn!("cannot build a pool of {threads} threads: {e}");
                    continue;
                }
            };
            match pool.install(|| segment(phantom, *seed, threads)) {
                Ok(p) => result.push(phantom.name, p),
                Err(e) => log::warn!("`{}` with {threads} threads failed: {e}", phantom.name),
            }
        }
    }
    result
}
