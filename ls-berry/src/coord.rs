//! 体素坐标.

use crate::Idx3d;
use itertools::iproduct;
use once_cell::sync::Lazy;

/// 体素坐标 `(x, y, z)`.
///
/// 分量使用有符号整数, 以便直接表示邻居偏移和删除标记.
/// 对应的 `ndarray` 索引为 `(z, y, x)`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Coord {
    /// 宽方向分量.
    pub x: i32,

    /// 高方向分量.
    pub y: i32,

    /// 切片方向分量.
    pub z: i32,
}

/// 26-邻域偏移表 (不含中心).
static OFFSETS_26: Lazy<Vec<(i32, i32, i32)>> = Lazy::new(|| {
    iproduct!(-1..=1, -1..=1, -1..=1)
        .filter(|&d| d != (0, 0, 0))
        .collect()
});

impl Coord {
    /// 延迟删除标记. 并行遍历中被标记的窄带槽位会在汇合后统一清理.
    pub const DELETED: Coord = Coord::new(-1, -1, -1);

    /// 创建坐标.
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// 从 `ndarray` 索引 `(z, y, x)` 创建坐标. 超出 `i32` 范围时行为未定义.
    #[inline]
    pub const fn from_idx((z, y, x): Idx3d) -> Self {
        Self::new(x as i32, y as i32, z as i32)
    }

    /// 是否是延迟删除标记?
    #[inline]
    pub const fn is_deleted(&self) -> bool {
        self.x == -1 && self.y == -1 && self.z == -1
    }

    /// 在形状为 `(z, y, x)` 的网格内时, 返回对应的 `ndarray` 索引.
    #[inline]
    pub fn to_idx(&self, (dz, dy, dx): Idx3d) -> Option<Idx3d> {
        let inside = |v: i32, len: usize| v >= 0 && (v as usize) < len;
        (inside(self.x, dx) && inside(self.y, dy) && inside(self.z, dz))
            .then_some((self.z as usize, self.y as usize, self.x as usize))
    }

    /// 平移.
    #[inline]
    pub const fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// 获得前后上下左右 6 个邻居坐标. 不检查越界.
    #[inline]
    pub const fn neighbours6(&self) -> [Coord; 6] {
        [
            self.offset(0, -1, 0),
            self.offset(0, 1, 0),
            self.offset(-1, 0, 0),
            self.offset(1, 0, 0),
            self.offset(0, 0, 1),
            self.offset(0, 0, -1),
        ]
    }

    /// 获得 26 个邻居坐标 (半径为 1 的立方邻域, 不含自身). 不检查越界.
    #[inline]
    pub fn neighbours26(&self) -> impl Iterator<Item = Coord> + '_ {
        OFFSETS_26
            .iter()
            .map(move |&(dx, dy, dz)| self.offset(dx, dy, dz))
    }

    /// 与 `other` 欧氏距离的平方. 对任意两个坐标都不会溢出.
    #[inline]
    pub const fn distance_squared(&self, other: &Coord) -> i128 {
        let dx = self.x as i128 - other.x as i128;
        let dy = self.y as i128 - other.y as i128;
        let dz = self.z as i128 - other.z as i128;
        dx * dx + dy * dy + dz * dz
    }
}

impl From<(i32, i32, i32)> for Coord {
    #[inline]
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}
