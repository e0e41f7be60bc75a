//! 内外两条窄带 (边界点列表).

use crate::Coord;
use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{
            IndexedParallelIterator, IntoParallelRefIterator, IntoParallelRefMutIterator,
            ParallelIterator,
        };
    }
}

/// 指定窄带.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Band {
    /// 内边界, 成员的 phi 状态恒为 `InnerBoundary`.
    Inner,

    /// 外边界, 成员的 phi 状态恒为 `OuterBoundary`.
    Outer,
}

/// 两条窄带. 每条窄带各由一把锁保护, 锁只在追加时持有.
///
/// 并行遍历某条窄带时, 先将其整体取出作为快照 (长度在遍历前确定,
/// 下标在遍历期间稳定), 遍历中新追加的点进入已被清空的共享列表,
/// 需要删除的槽位被就地写入 [`Coord::DELETED`]. 汇合后再统一压缩快照,
/// 并将新追加的点接在其后.
#[derive(Debug, Default)]
pub struct NarrowBands {
    inner: Mutex<Vec<Coord>>,
    outer: Mutex<Vec<Coord>>,
}

#[inline]
fn lock(m: &Mutex<Vec<Coord>>) -> MutexGuard<'_, Vec<Coord>> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[inline]
fn list_mut(m: &mut Mutex<Vec<Coord>>) -> &mut Vec<Coord> {
    m.get_mut().unwrap_or_else(PoisonError::into_inner)
}

impl NarrowBands {
    /// 创建两条空窄带.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn slot(&self, band: Band) -> &Mutex<Vec<Coord>> {
        match band {
            Band::Inner => &self.inner,
            Band::Outer => &self.outer,
        }
    }

    #[inline]
    fn slot_mut(&mut self, band: Band) -> &mut Vec<Coord> {
        match band {
            Band::Inner => list_mut(&mut self.inner),
            Band::Outer => list_mut(&mut self.outer),
        }
    }

    /// 向窄带追加一个点. 可被多个工作线程并发调用.
    #[inline]
    pub(crate) fn push(&self, band: Band, c: Coord) {
        lock(self.slot(band)).push(c);
    }

    /// 获取窄带的只读视图.
    #[inline]
    pub fn get(&mut self, band: Band) -> &[Coord] {
        self.slot_mut(band)
    }

    /// 复制窄带当前内容.
    #[inline]
    pub fn to_vec(&self, band: Band) -> Vec<Coord> {
        lock(self.slot(band)).clone()
    }

    /// 窄带长度.
    #[inline]
    pub fn len(&self, band: Band) -> usize {
        lock(self.slot(band)).len()
    }

    /// 两条窄带是否都为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len(Band::Inner) == 0 && self.len(Band::Outer) == 0
    }

    /// 清空两条窄带.
    pub fn clear(&mut self) {
        list_mut(&mut self.inner).clear();
        list_mut(&mut self.outer).clear();
    }

    /// 返回窄带长度, 以及其中满足 `pred` 的点数.
    pub(crate) fn count_where<F>(&self, band: Band, pred: F) -> (usize, usize)
    where
        F: Fn(Coord) -> bool,
    {
        let list = lock(self.slot(band));
        (list.len(), list.iter().filter(|c| pred(**c)).count())
    }

    /// 取出窄带作为本轮遍历的快照, 共享列表被置空以接收新追加的点.
    #[inline]
    pub(crate) fn take(&mut self, band: Band) -> Vec<Coord> {
        mem::take(self.slot_mut(band))
    }

    /// 压缩快照 (删除所有标记槽位, 不保证顺序), 并与遍历期间新追加的点合并.
    pub(crate) fn restore(&mut self, band: Band, mut snapshot: Vec<Coord>) -> usize {
        let before = snapshot.len();
        compact(&mut snapshot);
        let removed = before - snapshot.len();

        let appended = mem::replace(self.slot_mut(band), snapshot);
        self.slot_mut(band).extend(appended);
        removed
    }
}

/// 删除所有 [`Coord::DELETED`] 槽位.
pub(crate) fn compact(list: &mut Vec<Coord>) {
    list.retain(|c| !c.is_deleted());
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        /// 借助 `rayon`, 并行地对快照每个槽位实施 `op` 操作. `op` 同时携带槽位下标.
        ///
        /// 每个工作线程独占其槽位, 因此可以就地写入删除标记.
        pub(crate) fn for_each_slot<F>(slots: &mut [Coord], op: F)
        where
            F: Fn(usize, &mut Coord) + Sync + Send,
        {
            slots.par_iter_mut().enumerate().for_each(|(i, c)| op(i, c));
        }

        /// 借助 `rayon`, 并行地对快照每个槽位求值 `pred`. 结果与槽位一一对应.
        pub(crate) fn map_slots<F>(slots: &[Coord], pred: F) -> Vec<bool>
        where
            F: Fn(Coord) -> bool + Sync + Send,
        {
            slots.par_iter().map(|c| pred(*c)).collect()
        }
    } else {
        /// 依次对快照每个槽位实施 `op` 操作. `op` 同时携带槽位下标.
        pub(crate) fn for_each_slot<F>(slots: &mut [Coord], op: F)
        where
            F: Fn(usize, &mut Coord),
        {
            slots.iter_mut().enumerate().for_each(|(i, c)| op(i, c));
        }

        /// 依次对快照每个槽位求值 `pred`. 结果与槽位一一对应.
        pub(crate) fn map_slots<F>(slots: &[Coord], pred: F) -> Vec<bool>
        where
            F: Fn(Coord) -> bool,
        {
            slots.iter().map(|c| pred(*c)).collect()
        }
    }
}
