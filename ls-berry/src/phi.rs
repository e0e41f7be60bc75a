//! 四状态 phi 场, 即隐式曲面的离散表示.

use crate::consts::{phi, PhiTag};
use crate::kernel::GaussKernel;
use crate::{Coord, Idx3d, LevelSetError, LsResult};
use ndarray::{Array3, ArrayViewMut3, Zip};
use std::sync::atomic::{AtomicI8, Ordering};

/// 与输入体数据同形状的 phi 场, 每个体素一个 [`PhiTag`].
///
/// 底层以原子量存储, 因此可以在并行遍历窄带时被多个工作线程共享修改.
/// 所有访问都使用 `Relaxed` 序: 并行阶段的汇合点本身就是同步点.
///
/// 越界坐标的读取返回 `None`, 写入是空操作.
#[derive(Debug)]
pub struct PhiField {
    data: Array3<AtomicI8>,
}

impl PhiField {
    /// 创建形状为 `(z, y, x)` 的 phi 场, 所有体素均为 [`PhiTag::Exterior`].
    pub fn new(shape: Idx3d) -> Self {
        Self {
            data: Array3::from_shape_simple_fn(shape, || AtomicI8::new(phi::EXTERIOR)),
        }
    }

    /// 形状 `(z, y, x)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 坐标是否在场内?
    #[inline]
    pub fn contains(&self, c: Coord) -> bool {
        c.to_idx(self.shape()).is_some()
    }

    #[inline]
    fn cell(&self, c: Coord) -> Option<&AtomicI8> {
        self.data.get(c.to_idx(self.shape())?)
    }

    /// 获取 `c` 处的原始 phi 值. 越界时返回 `None`.
    #[inline]
    pub fn raw(&self, c: Coord) -> Option<i8> {
        self.cell(c).map(|a| a.load(Ordering::Relaxed))
    }

    /// 获取 `c` 处的状态. 越界时返回 `None`.
    #[inline]
    pub fn tag(&self, c: Coord) -> Option<PhiTag> {
        self.raw(c).and_then(PhiTag::from_raw)
    }

    /// `c` 是否属于分割结果 (前景, 即 `Interior` 或 `InnerBoundary`)?
    /// 越界时返回 `false`.
    #[inline]
    pub fn is_foreground(&self, c: Coord) -> bool {
        self.raw(c).is_some_and(phi::is_interior_side)
    }

    /// 将整个场填充为 `tag`.
    pub fn fill(&mut self, tag: PhiTag) {
        self.data
            .iter_mut()
            .for_each(|a| *a.get_mut() = tag.value());
    }

    /// 无条件写入, 返回旧状态. 越界时为空操作并返回 `None`.
    ///
    /// 交换是原子的: 对同一坐标并发写入同一状态时,
    /// 恰有一个调用者观察到旧值与新值不同.
    #[inline]
    pub(crate) fn swap(&self, c: Coord, tag: PhiTag) -> Option<PhiTag> {
        self.cell(c)
            .and_then(|a| PhiTag::from_raw(a.swap(tag.value(), Ordering::Relaxed)))
    }

    /// 仅当 `c` 的当前状态为 `from` 时写入 `to`. 返回是否写入成功.
    #[inline]
    pub(crate) fn promote(&self, c: Coord, from: PhiTag, to: PhiTag) -> bool {
        self.cell(c).is_some_and(|a| {
            a.compare_exchange(from.value(), to.value(), Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
        })
    }

    /// 判断 `c` 的所有场内 6-邻居是否都与 `sign` 同号 (`-1` 为内侧, `1` 为外侧).
    pub fn neighbours_same_sign(&self, c: Coord, sign: i8) -> bool {
        c.neighbours6()
            .into_iter()
            .filter_map(|n| self.raw(n))
            .all(|v| v.signum() == sign)
    }

    /// 以 `c` 为中心, 用 `kernel` 对原始 phi 值做卷积. 场外的核抽头被跳过.
    pub fn smoothed(&self, c: Coord, kernel: &GaussKernel) -> f64 {
        kernel
            .taps()
            .filter_map(|((dx, dy, dz), w)| Some(w * self.raw(c.offset(dx, dy, dz))? as f64))
            .sum()
    }

    /// 状态为 `tag` 的体素个数.
    pub fn count(&self, tag: PhiTag) -> usize {
        self.data
            .iter()
            .filter(|a| a.load(Ordering::Relaxed) == tag.value())
            .count()
    }

    /// 前景 (`Interior` + `InnerBoundary`) 体素个数.
    pub fn count_foreground(&self) -> usize {
        self.data
            .iter()
            .filter(|a| phi::is_interior_side(a.load(Ordering::Relaxed)))
            .count()
    }

    /// 按行优先序迭代 `(坐标, 状态)`.
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Coord, PhiTag)> + '_ {
        self.data.indexed_iter().filter_map(|(pos, a)| {
            Some((Coord::from_idx(pos), PhiTag::from_raw(a.load(Ordering::Relaxed))?))
        })
    }

    /// 导出为标签体数据: 前景体素为 `fg`, 其余为 `bg`. 结果按 `(z, y, x)` 组织.
    pub fn to_label(&self, fg: u8, bg: u8) -> Array3<u8> {
        self.data.map(|a| {
            if phi::is_interior_side(a.load(Ordering::Relaxed)) {
                fg
            } else {
                bg
            }
        })
    }

    /// 将前景体素以 `fg` 写入 `out`, 其余体素保持不变. 返回写入的体素个数.
    ///
    /// 若 `out` 形状与本场不同, 则返回 `Err`.
    pub fn write_label(&self, mut out: ArrayViewMut3<u8>, fg: u8) -> LsResult<usize> {
        if out.dim() != self.shape() {
            return Err(LevelSetError::ShapeMismatch(self.shape(), out.dim()));
        }
        let mut cnt = 0usize;
        Zip::from(&mut out).and(&self.data).for_each(|o, a| {
            if phi::is_interior_side(a.load(Ordering::Relaxed)) {
                *o = fg;
                cnt += 1;
            }
        });
        Ok(cnt)
    }
}
