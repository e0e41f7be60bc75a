//! 演化: 切入/切出, 冗余点剪除, 平滑, 停止判据, 手动/自动演化.

use super::{Intensity, LevelSet3d};
use crate::bands::{for_each_slot, map_slots, Band, NarrowBands};
use crate::consts::{PhiTag, STOP_RATIO};
use crate::phi::PhiField;
use crate::{Coord, LsResult};
use std::ops::ControlFlow;

/// 外窄带点 `c` 切入: 转为内窄带, 其 `Exterior` 6-邻居转为外窄带.
#[inline]
fn switch_in(phi: &PhiField, bands: &NarrowBands, c: Coord) {
    if phi.swap(c, PhiTag::InnerBoundary) != Some(PhiTag::InnerBoundary) {
        bands.push(Band::Inner, c);
    }
    for n in c.neighbours6() {
        if phi.promote(n, PhiTag::Exterior, PhiTag::OuterBoundary) {
            bands.push(Band::Outer, n);
        }
    }
}

/// 内窄带点 `c` 切出: 转为外窄带, 其 `Interior` 6-邻居转为内窄带.
#[inline]
fn switch_out(phi: &PhiField, bands: &NarrowBands, c: Coord) {
    if phi.swap(c, PhiTag::OuterBoundary) != Some(PhiTag::OuterBoundary) {
        bands.push(Band::Outer, c);
    }
    for n in c.neighbours6() {
        if phi.promote(n, PhiTag::Interior, PhiTag::InnerBoundary) {
            bands.push(Band::Inner, n);
        }
    }
}

/// 窄带中 "仍想翻转" 的点是否足够少. 空窄带视为已稳定.
#[inline]
fn settled(total: usize, agreeing: usize) -> bool {
    total == 0 || ((total - agreeing) as f64) < STOP_RATIO * total as f64
}

impl<'a, T: Intensity> LevelSet3d<'a, T> {
    /// 对窄带 `band` 的快照并行执行 `op`. `op` 返回 `true` 的槽位被删除.
    ///
    /// 返回被删除的点数.
    fn sweep<F>(&mut self, band: Band, op: F) -> usize
    where
        F: Fn(&PhiField, &NarrowBands, Coord) -> bool + Sync + Send,
    {
        let mut snapshot = self.bands.take(band);
        let (phi, bands) = (&self.phi, &self.bands);
        for_each_slot(&mut snapshot, |_, c| {
            if op(phi, bands, *c) {
                *c = Coord::DELETED;
            }
        });
        self.bands.restore(band, snapshot)
    }

    /// 向外演化: 速度为前景的外窄带点切入. 返回切入的点数.
    pub fn outward_evolution(&mut self) -> usize {
        let vf = &self.velocity;
        let mut snapshot = self.bands.take(Band::Outer);
        let (phi, bands) = (&self.phi, &self.bands);
        for_each_slot(&mut snapshot, |_, c| {
            if vf.resolve(*c).is_foreground() {
                switch_in(phi, bands, *c);
                *c = Coord::DELETED;
            }
        });
        self.bands.restore(Band::Outer, snapshot)
    }

    /// 向内演化: 速度为背景的内窄带点切出. 返回切出的点数.
    pub fn inward_evolution(&mut self) -> usize {
        let vf = &self.velocity;
        let mut snapshot = self.bands.take(Band::Inner);
        let (phi, bands) = (&self.phi, &self.bands);
        for_each_slot(&mut snapshot, |_, c| {
            if vf.resolve(*c).is_background() {
                switch_out(phi, bands, *c);
                *c = Coord::DELETED;
            }
        });
        self.bands.restore(Band::Inner, snapshot)
    }

    /// 剪除内窄带中所有场内 6-邻居均在内侧的点 (转为 `Interior`). 返回剪除的点数.
    pub fn remove_redundant_inner(&mut self) -> usize {
        self.sweep(Band::Inner, |phi, _, c| {
            let redundant = phi.neighbours_same_sign(c, -1);
            if redundant {
                phi.swap(c, PhiTag::Interior);
            }
            redundant
        })
    }

    /// 剪除外窄带中所有场内 6-邻居均在外侧的点 (转为 `Exterior`). 返回剪除的点数.
    pub fn remove_redundant_outer(&mut self) -> usize {
        self.sweep(Band::Outer, |phi, _, c| {
            let redundant = phi.neighbours_same_sign(c, 1);
            if redundant {
                phi.swap(c, PhiTag::Exterior);
            }
            redundant
        })
    }

    /// 以高斯核平滑界面.
    ///
    /// 先处理内窄带: 卷积结果为正的点切出, 随后剪除外窄带;
    /// 再处理外窄带: 卷积结果为负的点切入, 随后剪除内窄带.
    /// 每一半都先基于当前 phi 场并行求出全部决策, 再统一翻转, 因此结果与调度无关.
    pub fn smooth_step(&mut self) {
        let kernel = &self.kernel;

        let flags = {
            let phi = &self.phi;
            map_slots(&self.bands.to_vec(Band::Inner), |c| {
                phi.smoothed(c, kernel) > 0.0
            })
        };
        let out = self.flip_flagged(Band::Inner, &flags);
        let pruned_out = self.remove_redundant_outer();

        let kernel = &self.kernel;
        let flags = {
            let phi = &self.phi;
            map_slots(&self.bands.to_vec(Band::Outer), |c| {
                phi.smoothed(c, kernel) < 0.0
            })
        };
        let inn = self.flip_flagged(Band::Outer, &flags);
        let pruned_in = self.remove_redundant_inner();

        log::debug!(
            "smooth step: switched out = {out}, switched in = {inn}, pruned = {}",
            pruned_out + pruned_in
        );
    }

    /// 翻转窄带中 `flags` 标记的槽位. `flags` 必须与窄带当前内容一一对应.
    fn flip_flagged(&mut self, band: Band, flags: &[bool]) -> usize {
        let mut snapshot = self.bands.take(band);
        debug_assert_eq!(snapshot.len(), flags.len());
        let (phi, bands) = (&self.phi, &self.bands);
        for_each_slot(&mut snapshot, |i, c| {
            if flags.get(i).copied().unwrap_or(false) {
                match band {
                    Band::Inner => switch_out(phi, bands, *c),
                    Band::Outer => switch_in(phi, bands, *c),
                }
                *c = Coord::DELETED;
            }
        });
        self.bands.restore(band, snapshot)
    }

    /// 停止判据.
    ///
    /// 外窄带中速度为背景的点, 与内窄带中速度为前景的点, 都 "不想" 翻转.
    /// 当两条窄带中想翻转的点都少于其长度的 [`STOP_RATIO`] 时, 返回 `true`.
    pub fn stopping_criterion(&self) -> bool {
        let vf = &self.velocity;
        let (n_out, bg) = self
            .bands
            .count_where(Band::Outer, |c| vf.resolve(c).is_background());
        if !settled(n_out, bg) {
            return false;
        }
        let (n_in, fg) = self
            .bands
            .count_where(Band::Inner, |c| vf.resolve(c).is_foreground());
        settled(n_in, fg)
    }

    /// 执行一步演化. `index` 为本轮运行中的步序号. 返回本步是否做了平滑.
    fn step(&mut self, index: usize) -> bool {
        if self.config.outward {
            let n = self.outward_evolution();
            let pruned = self.remove_redundant_inner();
            log::trace!("step {index}: switched in = {n}, pruned inner = {pruned}");
        }
        if self.config.inward {
            let n = self.inward_evolution();
            let pruned = self.remove_redundant_outer();
            log::trace!("step {index}: switched out = {n}, pruned outer = {pruned}");
        }
        log::trace!(
            "step {index}: inner = {}, outer = {}",
            self.bands.len(Band::Inner),
            self.bands.len(Band::Outer)
        );

        match self.config.smoothing {
            Some(s) if index % s.every == 0 => {
                self.smooth_step();
                true
            }
            _ => false,
        }
    }

    /// 无条件演化 `iterations` 步. 返回实际执行的步数.
    ///
    /// 若尚未初始化种子或速度场未定义, 则返回 `Err`.
    pub fn manual_evolution(&mut self, iterations: usize) -> LsResult<usize> {
        self.check_ready()?;
        for i in 0..iterations {
            self.step(i);
        }
        Ok(iterations)
    }

    /// 自动演化, 直到满足停止判据或达到 `max_iterations` 步. 返回实际执行的步数.
    pub fn automatic_evolution(&mut self, max_iterations: usize) -> LsResult<usize> {
        self.automatic_evolution_with(max_iterations, |_| ControlFlow::Continue(()))
    }

    /// 自动演化, 每完成一步调用一次 `progress(步序号)`.
    ///
    /// 每 `stop_check_every` 步检查一次停止判据. `progress` 返回 `Break` 时,
    /// 在当前步结束后立即返回. 正常结束时, 若距离上次平滑已超过平滑周期的一半,
    /// 则额外平滑一次.
    pub fn automatic_evolution_with<F>(
        &mut self,
        max_iterations: usize,
        mut progress: F,
    ) -> LsResult<usize>
    where
        F: FnMut(usize) -> ControlFlow<()>,
    {
        self.check_ready()?;
        log::info!(
            "automatic evolution: max = {max_iterations}, inner = {}, outer = {}",
            self.bands.len(Band::Inner),
            self.bands.len(Band::Outer)
        );

        let check_every = self.config.stop_check_every;
        let mut count = 0usize;
        let mut last_smooth = 0usize;
        while count < max_iterations {
            for _ in 0..check_every {
                if count >= max_iterations {
                    break;
                }
                if self.step(count) {
                    last_smooth = count;
                }
                let flow = progress(count);
                count += 1;
                if flow.is_break() {
                    log::info!("automatic evolution cancelled after {count} steps");
                    return Ok(count);
                }
            }
            if self.stopping_criterion() {
                break;
            }
        }

        if let Some(s) = self.config.smoothing {
            if count - last_smooth > s.every / 2 {
                self.smooth_step();
            }
        }
        log::info!(
            "automatic evolution finished: steps = {count}, foreground = {}",
            self.phi.count_foreground()
        );
        Ok(count)
    }
}
