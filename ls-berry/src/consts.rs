//! 通用常量.

/// phi 函数的原始数值. 数值从 "深内部" 到 "深外部" 单调递增.
pub mod phi {
    /// 实心前景, 不在任何窄带列表中.
    pub const INTERIOR: i8 = -3;

    /// 内边界, 是 `inner` 窄带的成员.
    pub const INNER_BOUNDARY: i8 = -1;

    /// 外边界, 是 `outer` 窄带的成员.
    pub const OUTER_BOUNDARY: i8 = 1;

    /// 实心背景, 不被追踪.
    pub const EXTERIOR: i8 = 3;

    /// 该 phi 值是否位于界面内侧 (负号)?
    #[inline]
    pub const fn is_interior_side(v: i8) -> bool {
        v < 0
    }

    /// 该 phi 值是否位于界面外侧 (正号)?
    #[inline]
    pub const fn is_exterior_side(v: i8) -> bool {
        v > 0
    }
}

/// 速度场的原始数值.
pub mod vf {
    /// 尚未计算.
    pub const UNKNOWN: u8 = 0;

    /// 前景.
    pub const FOREGROUND: u8 = 1;

    /// 背景.
    pub const BACKGROUND: u8 = 100;
}

/// 停止判据常数: 当仍 "想要" 翻转的边界点少于该比例时视为收敛.
pub const STOP_RATIO: f64 = 0.001;

/// 体素在 phi 场中的四种状态.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(i8)]
pub enum PhiTag {
    /// 实心前景.
    Interior = phi::INTERIOR,

    /// 内边界 (`inner` 窄带成员).
    InnerBoundary = phi::INNER_BOUNDARY,

    /// 外边界 (`outer` 窄带成员).
    OuterBoundary = phi::OUTER_BOUNDARY,

    /// 实心背景.
    Exterior = phi::EXTERIOR,
}

impl PhiTag {
    /// 从原始数值构建. 非法值返回 `None`.
    #[inline]
    pub const fn from_raw(v: i8) -> Option<Self> {
        match v {
            phi::INTERIOR => Some(Self::Interior),
            phi::INNER_BOUNDARY => Some(Self::InnerBoundary),
            phi::OUTER_BOUNDARY => Some(Self::OuterBoundary),
            phi::EXTERIOR => Some(Self::Exterior),
            _ => None,
        }
    }

    /// 原始数值, 平滑卷积时直接参与运算.
    #[inline]
    pub const fn value(self) -> i8 {
        self as i8
    }

    /// 符号: 内侧为 `-1`, 外侧为 `1`.
    #[inline]
    pub const fn sign(self) -> i8 {
        if self.is_interior_side() {
            -1
        } else {
            1
        }
    }

    /// 是否位于界面内侧 (`Interior` 或 `InnerBoundary`)?
    #[inline]
    pub const fn is_interior_side(self) -> bool {
        phi::is_interior_side(self.value())
    }

    /// 是否位于界面外侧 (`Exterior` 或 `OuterBoundary`)?
    #[inline]
    pub const fn is_exterior_side(self) -> bool {
        phi::is_exterior_side(self.value())
    }

    /// 是否是窄带成员?
    #[inline]
    pub const fn is_boundary(self) -> bool {
        matches!(self, Self::InnerBoundary | Self::OuterBoundary)
    }
}

/// 速度场中单个体素的分类结果.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Velocity {
    /// 尚未计算, 或分类器无法判定.
    Unknown = vf::UNKNOWN,

    /// 前景.
    Foreground = vf::FOREGROUND,

    /// 背景.
    Background = vf::BACKGROUND,
}

impl Velocity {
    /// 从原始数值构建. 无法识别的值视为 `Unknown`.
    #[inline]
    pub const fn from_raw(v: u8) -> Self {
        match v {
            vf::FOREGROUND => Self::Foreground,
            vf::BACKGROUND => Self::Background,
            _ => Self::Unknown,
        }
    }

    /// 原始数值.
    #[inline]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// 是否为前景.
    #[inline]
    pub const fn is_foreground(self) -> bool {
        matches!(self, Self::Foreground)
    }

    /// 是否为背景.
    #[inline]
    pub const fn is_background(self) -> bool {
        matches!(self, Self::Background)
    }

    /// 是否已确定 (非 `Unknown`).
    #[inline]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// 按极性构建: `true` 为前景, `false` 为背景.
    #[inline]
    pub const fn from_foreground(fg: bool) -> Self {
        if fg {
            Self::Foreground
        } else {
            Self::Background
        }
    }
}
