//! 速度场与体素分类器.

use crate::consts::{vf, Velocity};
use crate::{Coord, Idx3d};
use ndarray::{Array3, Axis};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 用户提供的体素分类器. 返回 [`Velocity::Unknown`] 表示无法判定.
pub type Classifier = dyn Fn(Coord) -> Velocity + Send + Sync;

/// 与输入体数据同形状的速度场, 每个体素一个 [`Velocity`].
///
/// 若安装了自定义分类器, 则 [`VelocityField::resolve`] 会在访问时惰性计算并缓存.
pub struct VelocityField {
    data: Array3<AtomicU8>,
    custom: Option<Box<Classifier>>,
}

impl fmt::Debug for VelocityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VelocityField")
            .field("shape", &self.shape())
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

impl VelocityField {
    /// 创建形状为 `(z, y, x)` 的速度场, 所有体素均为 [`Velocity::Unknown`].
    pub fn new(shape: Idx3d) -> Self {
        Self {
            data: Array3::from_shape_simple_fn(shape, || AtomicU8::new(vf::UNKNOWN)),
            custom: None,
        }
    }

    /// 形状 `(z, y, x)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    #[inline]
    fn cell(&self, c: Coord) -> Option<&AtomicU8> {
        self.data.get(c.to_idx(self.shape())?)
    }

    /// 获取 `c` 处已缓存的值, 不触发惰性计算. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, c: Coord) -> Option<Velocity> {
        self.cell(c)
            .map(|a| Velocity::from_raw(a.load(Ordering::Relaxed)))
    }

    #[inline]
    fn store(&self, c: Coord, v: Velocity) {
        if let Some(a) = self.cell(c) {
            a.store(v.value(), Ordering::Relaxed);
        }
    }

    /// 将整个速度场填充为 `v`.
    pub fn fill(&mut self, v: Velocity) {
        self.data.iter_mut().for_each(|a| *a.get_mut() = v.value());
    }

    /// 是否安装了自定义分类器?
    #[inline]
    pub fn has_custom(&self) -> bool {
        self.custom.is_some()
    }

    /// 安装自定义分类器, 并将整个速度场重置为 `Unknown`.
    pub fn set_custom_fn<F>(&mut self, f: F)
    where
        F: Fn(Coord) -> Velocity + Send + Sync + 'static,
    {
        self.fill(Velocity::Unknown);
        self.custom = Some(Box::new(f));
    }

    /// 移除自定义分类器. 已缓存的值保持不变.
    pub fn clear_custom_fn(&mut self) {
        self.custom = None;
    }

    /// 是否可以驱动演化: 存在已确定的体素, 或安装了自定义分类器.
    pub fn is_populated(&self) -> bool {
        self.has_custom()
            || self
                .data
                .iter()
                .any(|a| a.load(Ordering::Relaxed) != vf::UNKNOWN)
    }

    /// 获取 `c` 处的速度值. 越界时返回 `Unknown`.
    ///
    /// 若没有自定义分类器, 直接返回缓存值. 否则, 若缓存值为 `Unknown`,
    /// 先调用自定义分类器; 若其仍无法判定, 则在 26-邻域内对已知的前景/背景
    /// 计票, 前景严格多于背景时取前景, 否则取背景. 结果被缓存.
    pub fn resolve(&self, c: Coord) -> Velocity {
        let Some(cached) = self.get(c) else {
            return Velocity::Unknown;
        };
        let Some(custom) = self.custom.as_deref() else {
            return cached;
        };
        if cached.is_known() {
            return cached;
        }

        let mut v = custom(c);
        if !v.is_known() {
            v = self.majority(c);
        }
        self.store(c, v);
        v
    }

    /// 26-邻域多数表决. 平票时取背景.
    pub fn majority(&self, c: Coord) -> Velocity {
        let (mut fg, mut bg) = (0usize, 0usize);
        for v in c.neighbours26().filter_map(|n| self.get(n)) {
            match v {
                Velocity::Foreground => fg += 1,
                Velocity::Background => bg += 1,
                Velocity::Unknown => {}
            }
        }
        Velocity::from_foreground(fg > bg)
    }

    /// 值为 `v` 的体素个数.
    pub fn count(&self, v: Velocity) -> usize {
        self.data
            .iter()
            .filter(|a| a.load(Ordering::Relaxed) == v.value())
            .count()
    }

    /// 导出原始数值 (`0`, `1`, `100`), 按 `(z, y, x)` 组织.
    pub fn to_raw(&self) -> Array3<u8> {
        self.data.map(|a| a.load(Ordering::Relaxed))
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        impl VelocityField {
            /// 借助 `rayon`, 按水平切片并行地以 `op(索引)` 填充整个速度场.
            pub fn fill_with<F>(&mut self, op: F)
            where
                F: Fn(Idx3d) -> Velocity + Sync + Send,
            {
                self.data
                    .axis_iter_mut(Axis(0))
                    .into_par_iter()
                    .enumerate()
                    .for_each(|(z, mut sli)| {
                        for ((y, x), a) in sli.indexed_iter_mut() {
                            *a.get_mut() = op((z, y, x)).value();
                        }
                    });
            }
        }
    } else {
        impl VelocityField {
            /// 按水平切片以 `op(索引)` 填充整个速度场.
            pub fn fill_with<F>(&mut self, op: F)
            where
                F: Fn(Idx3d) -> Velocity,
            {
                for (z, mut sli) in self.data.axis_iter_mut(Axis(0)).enumerate() {
                    for ((y, x), a) in sli.indexed_iter_mut() {
                        *a.get_mut() = op((z, y, x)).value();
                    }
                }
            }
        }
    }
}

/// 均值分离分类.
///
/// 比较 `v` 到背景均值与前景均值的加权平方距离:
/// `wb * (v - bg_mean)^2 - wf * (v - fg_mean)^2 >= 0` 时为前景.
#[inline]
pub fn mean_separation(v: f64, fg_mean: f64, bg_mean: f64, wf: f64, wb: f64) -> Velocity {
    let a = v * v;
    let f = v + v;
    let d = (a - bg_mean * (f - bg_mean)) * wb - (a - fg_mean * (f - fg_mean)) * wf;
    Velocity::from_foreground(d >= 0.0)
}

/// 均值 + 方差分离分类. `sf`, `sb` 分别是前景与背景的标准差.
///
/// 近似两个一元正态模型之间的对数似然比检验. 注意: 该判别式的线性项系数为
/// `4v` (而非 `2v`), 对数项为 `ln(sb * sb / sf * sf)`, 按从左到右结合即
/// `ln(sb^2)`, 而非方差比 `ln(sb^2 / sf^2)`. 此处保持历史结果不变,
/// 对照见 [`gaussian_log_likelihood_ratio`] 及其测试.
#[inline]
pub fn mean_variance_separation(
    v: f64,
    fg_mean: f64,
    bg_mean: f64,
    sf: f64,
    sb: f64,
) -> Velocity {
    let a = v * v;
    let d = 1.0 / (sf * sf);
    let e = 1.0 / (sb * sb);
    let f = fg_mean * fg_mean * d;
    let g = bg_mean * bg_mean * e;
    #[allow(clippy::suspicious_operation_groupings)]
    let h = (sb * sb / sf * sf).ln();

    let v4 = 4.0 * v;
    let disc = e * (a - v4 * bg_mean) + g - (d * (a - v4 * fg_mean) + f) + h;
    Velocity::from_foreground(disc >= 0.0)
}

/// 教科书形式的高斯对数似然比判别式 (以前景为正):
/// `(v - mb)^2 / sb^2 - (v - mf)^2 / sf^2 + ln(sb^2 / sf^2)`.
///
/// 仅用于与 [`mean_variance_separation`] 对照.
#[inline]
pub fn gaussian_log_likelihood_ratio(v: f64, fg_mean: f64, bg_mean: f64, sf: f64, sb: f64) -> f64 {
    (v - bg_mean).powi(2) / (sb * sb) - (v - fg_mean).powi(2) / (sf * sf)
        + (sb * sb / (sf * sf)).ln()
}
