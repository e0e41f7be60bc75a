//! 速度场的填充.

use super::{Intensity, LevelSet3d};
use crate::consts::Velocity;
use crate::stats::RegionStatistics;
use crate::velocity::{mean_separation, mean_variance_separation};
use crate::{Coord, LevelSetError, LsResult};
use ndarray::ArrayView3;
use std::sync::atomic::{AtomicBool, Ordering};

impl<'a, T: Intensity> LevelSet3d<'a, T> {
    /// 以当前 phi 场划分前景/背景, 计算区域统计量并缓存.
    ///
    /// 若前景或背景为空, 则返回 `Err`, 已缓存的统计量保持不变.
    pub fn compute_mean(&mut self) -> LsResult<RegionStatistics> {
        let stats = RegionStatistics::compute(self.volume, &self.phi)?;
        if !stats.is_valid() {
            return Err(LevelSetError::EmptyRegion);
        }
        log::debug!(
            "region statistics: fg = {:.3} ({}), bg = {:.3} ({})",
            stats.foreground_mean,
            stats.foreground_count,
            stats.background_mean,
            stats.background_count
        );
        self.stats = stats;
        Ok(stats)
    }

    #[inline]
    fn valid_stats(&self) -> LsResult<RegionStatistics> {
        if self.stats.is_valid() {
            Ok(self.stats)
        } else {
            Err(LevelSetError::EmptyRegion)
        }
    }

    /// 以均值分离填充速度场. `wf`, `wb` 分别为前景与背景的权重.
    ///
    /// 需要先调用 [`LevelSet3d::compute_mean`], 否则返回 `Err`.
    pub fn compute_vf_mean(&mut self, wf: f64, wb: f64) -> LsResult<()> {
        let s = self.valid_stats()?;
        let vol = self.volume;
        self.velocity.fill_with(|idx| {
            mean_separation(
                vol[idx].intensity(),
                s.foreground_mean,
                s.background_mean,
                wf,
                wb,
            )
        });
        Ok(())
    }

    /// 以均值 + 方差分离填充速度场. `sf`, `sb` 分别为前景与背景的标准差,
    /// 一般取 [`RegionStatistics::foreground_std`] 与 [`RegionStatistics::background_std`].
    ///
    /// 需要先调用 [`LevelSet3d::compute_mean`], 否则返回 `Err`.
    pub fn compute_vf_mean_variance(&mut self, sf: f64, sb: f64) -> LsResult<()> {
        let s = self.valid_stats()?;
        let vol = self.volume;
        self.velocity.fill_with(|idx| {
            mean_variance_separation(
                vol[idx].intensity(),
                s.foreground_mean,
                s.background_mean,
                sf,
                sb,
            )
        });
        Ok(())
    }

    /// 由标签体数据填充速度场: 非零标签为前景, 零为背景. `inverted` 时极性相反.
    ///
    /// 返回是否存在非零标签. 若形状不一致, 则返回 `Err`.
    pub fn set_vf_from_labels(&mut self, labels: ArrayView3<u8>, inverted: bool) -> LsResult<bool> {
        self.check_label_shape(&labels)?;
        let got_some = AtomicBool::new(false);
        self.velocity.fill_with(|idx| {
            let labeled = labels[idx] > 0;
            if labeled {
                got_some.store(true, Ordering::Relaxed);
            }
            Velocity::from_foreground(labeled != inverted)
        });
        Ok(got_some.into_inner())
    }

    /// 由标签体数据填充速度场: 值为 `active` 的体素为前景, 其余为背景.
    ///
    /// 若形状不一致, 则返回 `Err`.
    pub fn set_vf_from_region(&mut self, labels: ArrayView3<u8>, active: u8) -> LsResult<()> {
        self.check_label_shape(&labels)?;
        self.velocity
            .fill_with(|idx| Velocity::from_foreground(labels[idx] == active));
        Ok(())
    }

    /// 对每个体素调用 `f` 一次, 以其结果填充速度场.
    pub fn set_vf_custom<F>(&mut self, f: F)
    where
        F: Fn(Coord) -> Velocity + Sync + Send,
    {
        self.velocity.fill_with(|idx| f(Coord::from_idx(idx)));
    }

    /// 安装惰性分类器, 并将速度场重置为 `Unknown`.
    ///
    /// 演化访问某体素时才调用 `f`; `f` 无法判定时, 取 26-邻域内已知值的多数.
    ///
    /// 表决只统计当时已解析的邻居. 若 `f` 在尚无已知邻居的体素上返回 `Unknown`,
    /// 并行演化的结果可能随线程调度而不同.
    pub fn set_vf_custom_fn<F>(&mut self, f: F)
    where
        F: Fn(Coord) -> Velocity + Send + Sync + 'static,
    {
        self.velocity.set_custom_fn(f);
    }

    /// 移除惰性分类器.
    pub fn clear_vf_custom_fn(&mut self) {
        self.velocity.clear_custom_fn();
    }

    /// 获取 `c` 处的速度值, 必要时惰性计算. 越界时返回 `Unknown`.
    #[inline]
    pub fn vf_at(&self, c: Coord) -> Velocity {
        self.velocity.resolve(c)
    }

    fn check_label_shape(&self, labels: &ArrayView3<u8>) -> LsResult<()> {
        if labels.dim() != self.shape() {
            return Err(LevelSetError::ShapeMismatch(self.shape(), labels.dim()));
        }
        Ok(())
    }
}
