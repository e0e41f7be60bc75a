//! 窄带水平集演化引擎.
//!
//! 引擎独占 phi 场, 两条窄带, 速度场, 区域统计量和平滑核; 输入体数据以只读视图借用.
//!
//! 典型用法:
//!
//! 1. [`LevelSet3d::prepare_volumes`] 创建引擎;
//! 2. 用某个种子初始化 ([`LevelSet3d::initial_sphere`], [`LevelSet3d::initial_cube`],
//!    [`LevelSet3d::initialize_from_region`]);
//! 3. 填充速度场 (由统计量, 标签或自定义分类器);
//! 4. 手动或自动演化;
//! 5. 通过 [`LevelSet3d::phi`] 读取分割结果.

mod evolution;
mod init;
mod vf;

pub use init::CubeGeometry;

use crate::bands::{Band, NarrowBands};
use crate::config::LevelSetConfig;
use crate::kernel::GaussKernel;
use crate::phi::PhiField;
use crate::stats::RegionStatistics;
use crate::velocity::VelocityField;
use crate::{Coord, Idx3d, LevelSetError, LsResult};
use ndarray::ArrayView3;
use num::ToPrimitive;

/// 可作为输入体数据元素的数值类型.
pub trait Intensity: ToPrimitive + Copy + Send + Sync {
    /// 转换为 `f64`. 无法表示时为 `NaN`.
    #[inline]
    fn intensity(&self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

impl<T: ToPrimitive + Copy + Send + Sync> Intensity for T {}

/// 三维窄带水平集分割引擎.
#[derive(Debug)]
pub struct LevelSet3d<'a, T: Intensity> {
    volume: ArrayView3<'a, T>,
    phi: PhiField,
    velocity: VelocityField,
    bands: NarrowBands,
    stats: RegionStatistics,
    kernel: GaussKernel,
    config: LevelSetConfig,
}

impl<'a, T: Intensity> LevelSet3d<'a, T> {
    /// 为体数据 `volume` 准备 phi 场与速度场.
    ///
    /// phi 场全部为 `Exterior`, 速度场全部为 `Unknown`, 两条窄带为空.
    /// 若 `config` 非法, 则返回 `Err`.
    pub fn prepare_volumes(volume: ArrayView3<'a, T>, config: LevelSetConfig) -> LsResult<Self> {
        config.validate()?;
        let kernel = config.smoothing.unwrap_or_default().kernel()?;
        let shape = volume.dim();
        log::debug!("prepare level set volumes: shape = {shape:?}");
        Ok(Self {
            volume,
            phi: PhiField::new(shape),
            velocity: VelocityField::new(shape),
            bands: NarrowBands::new(),
            stats: RegionStatistics::default(),
            kernel,
            config,
        })
    }

    /// 体数据形状 `(z, y, x)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.volume.dim()
    }

    /// 当前配置.
    #[inline]
    pub fn config(&self) -> &LevelSetConfig {
        &self.config
    }

    /// 替换配置. 若新配置非法, 则返回 `Err` 且原配置保持不变.
    pub fn set_config(&mut self, config: LevelSetConfig) -> LsResult<()> {
        config.validate()?;
        self.kernel = config.smoothing.unwrap_or_default().kernel()?;
        self.config = config;
        Ok(())
    }

    /// phi 场 (分割结果).
    #[inline]
    pub fn phi(&self) -> &PhiField {
        &self.phi
    }

    /// 速度场.
    #[inline]
    pub fn velocity(&self) -> &VelocityField {
        &self.velocity
    }

    /// 内窄带的一份拷贝.
    pub fn inner_band(&self) -> Vec<Coord> {
        self.bands.to_vec(Band::Inner)
    }

    /// 外窄带的一份拷贝.
    pub fn outer_band(&self) -> Vec<Coord> {
        self.bands.to_vec(Band::Outer)
    }

    /// 边界点个数, 即外窄带长度.
    #[inline]
    pub fn boundary_points_count(&self) -> usize {
        self.bands.len(Band::Outer)
    }

    /// 最近一次 [`LevelSet3d::compute_mean`] 的结果.
    #[inline]
    pub fn statistics(&self) -> &RegionStatistics {
        &self.stats
    }

    /// 清空两条窄带. phi 场保持不变.
    pub fn clear_boundary(&mut self) {
        self.bands.clear();
    }

    /// 演化前的检查.
    fn check_ready(&self) -> LsResult<()> {
        if self.bands.is_empty() {
            return Err(LevelSetError::EmptyNarrowBand);
        }
        if !self.velocity.is_populated() {
            return Err(LevelSetError::VelocityUndefined);
        }
        Ok(())
    }
}
