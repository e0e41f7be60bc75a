//! 运行时错误.

use std::fmt;

/// 水平集分割的运行时错误.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelSetError {
    /// 两个窄带均为空, 即尚未用任何种子初始化.
    EmptyNarrowBand,

    /// 速度场从未被计算, 且没有安装自定义分类器.
    VelocityUndefined,

    /// 输入体数据形状与引擎不一致.
    ///
    /// 第一个参数是引擎的 `(z, y, x)` 形状, 第二个参数是输入的形状.
    ShapeMismatch((usize, usize, usize), (usize, usize, usize)),

    /// 前景或背景区域为空, 无法计算区域统计量.
    EmptyRegion,

    /// 种子在裁剪后过小, 放不下内外两层边界.
    SeedTooSmall,

    /// 平滑核参数非法 (尺寸必须为正奇数, sigma 必须为正有限值).
    InvalidKernel(usize, f64),

    /// 配置参数非法. 参数为字段名.
    InvalidConfig(&'static str),
}

impl fmt::Display for LevelSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyNarrowBand => write!(f, "窄带为空, 请先初始化种子"),
            Self::VelocityUndefined => write!(f, "速度场尚未计算"),
            Self::ShapeMismatch(expected, got) => {
                write!(f, "体数据形状不一致: 期望 {expected:?}, 实际 {got:?}")
            }
            Self::EmptyRegion => write!(f, "前景或背景区域为空"),
            Self::SeedTooSmall => write!(f, "种子过小"),
            Self::InvalidKernel(size, sigma) => {
                write!(f, "平滑核参数非法: size = {size}, sigma = {sigma}")
            }
            Self::InvalidConfig(field) => write!(f, "配置参数非法: `{field}`"),
        }
    }
}

impl std::error::Error for LevelSetError {}
