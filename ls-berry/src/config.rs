//! 演化参数.

use crate::kernel::GaussKernel;
use crate::{LevelSetError, LsResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 周期性平滑的参数.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SmoothingSpec {
    /// 每隔多少步平滑一次. 必须为正.
    pub every: usize,

    /// 高斯核边长. 必须为正奇数.
    pub kernel_size: usize,

    /// 高斯核标准差. 必须为正有限值.
    pub sigma: f64,
}

impl Default for SmoothingSpec {
    fn default() -> Self {
        Self {
            every: 5,
            kernel_size: 3,
            sigma: 1.0,
        }
    }
}

impl SmoothingSpec {
    /// 创建平滑参数. 参数合法性在 [`LevelSetConfig::validate`] 中检查.
    pub const fn new(every: usize, kernel_size: usize, sigma: f64) -> Self {
        Self {
            every,
            kernel_size,
            sigma,
        }
    }

    /// 按参数构建高斯核.
    pub fn kernel(&self) -> LsResult<GaussKernel> {
        GaussKernel::new(self.kernel_size, self.sigma)
    }
}

/// 单次分割运行的配置.
///
/// ```
/// use ls_berry::{LevelSetConfig, SmoothingSpec};
///
/// let cfg = LevelSetConfig::default()
///     .with_inward(false)
///     .with_smoothing(SmoothingSpec::new(4, 5, 1.5));
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LevelSetConfig {
    /// 是否允许界面向外扩张 (外边界点切入).
    pub outward: bool,

    /// 是否允许界面向内收缩 (内边界点切出).
    pub inward: bool,

    /// 自动演化时, 每隔多少步检查一次停止判据. 必须为正.
    pub stop_check_every: usize,

    /// 周期性平滑. `None` 表示不平滑.
    pub smoothing: Option<SmoothingSpec>,
}

impl Default for LevelSetConfig {
    fn default() -> Self {
        Self {
            outward: true,
            inward: true,
            stop_check_every: 1,
            smoothing: None,
        }
    }
}

impl LevelSetConfig {
    /// 设置是否向外演化.
    pub fn with_outward(mut self, outward: bool) -> Self {
        self.outward = outward;
        self
    }

    /// 设置是否向内演化.
    pub fn with_inward(mut self, inward: bool) -> Self {
        self.inward = inward;
        self
    }

    /// 设置停止判据的检查周期.
    pub fn with_stop_check_every(mut self, every: usize) -> Self {
        self.stop_check_every = every;
        self
    }

    /// 打开周期性平滑.
    pub fn with_smoothing(mut self, spec: SmoothingSpec) -> Self {
        self.smoothing = Some(spec);
        self
    }

    /// 关闭周期性平滑.
    pub fn without_smoothing(mut self) -> Self {
        self.smoothing = None;
        self
    }

    /// 检查参数. 非法时返回 `Err`.
    pub fn validate(&self) -> LsResult<()> {
        if self.stop_check_every == 0 {
            return Err(LevelSetError::InvalidConfig("stop_check_every"));
        }
        if let Some(s) = &self.smoothing {
            if s.every == 0 {
                return Err(LevelSetError::InvalidConfig("smoothing.every"));
            }
            s.kernel()?;
        }
        Ok(())
    }
}
