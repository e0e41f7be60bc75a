//! 前景/背景区域统计量.

use crate::phi::PhiField;
use crate::{Intensity, LevelSetError, LsResult};
use ndarray::{ArrayView2, ArrayView3, Axis};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 单个区域的累加器.
#[derive(Copy, Clone, Debug, Default)]
struct Acc {
    count: u64,
    sum: f64,
    sum_sq: f64,
}

impl Acc {
    #[inline]
    fn push(&mut self, v: f64) {
        self.count += 1;
        self.sum += v;
        self.sum_sq += v * v;
    }

    #[inline]
    fn merge(mut self, other: Acc) -> Acc {
        self.count += other.count;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        self
    }

    #[inline]
    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }

    /// 总体方差. 以均值修正, 避免负值.
    #[inline]
    fn variance(&self) -> f64 {
        let m = self.mean();
        (self.sum_sq / self.count as f64 - m * m).max(0.0)
    }
}

/// 由当前 phi 场划分得到的前景/背景统计量.
///
/// `Interior` 与 `InnerBoundary` 体素计入前景, 其余体素计入背景.
/// 区域为空时, 对应的均值与方差为 `NaN`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegionStatistics {
    /// 前景均值.
    pub foreground_mean: f64,

    /// 背景均值.
    pub background_mean: f64,

    /// 前景总体方差.
    pub foreground_variance: f64,

    /// 背景总体方差.
    pub background_variance: f64,

    /// 前景体素个数.
    pub foreground_count: u64,

    /// 背景体素个数.
    pub background_count: u64,
}

impl RegionStatistics {
    /// 扫描整个体数据计算统计量. 若 `volume` 与 `phi` 形状不一致, 则返回 `Err`.
    ///
    /// 按水平切片分别累加, 再按切片顺序合并, 因此结果与线程数无关.
    pub fn compute<T: Intensity>(volume: ArrayView3<'_, T>, phi: &PhiField) -> LsResult<Self> {
        if volume.dim() != phi.shape() {
            return Err(LevelSetError::ShapeMismatch(phi.shape(), volume.dim()));
        }
        let labels = phi.to_label(1, 0);

        let per_slice = |(vol, lab): (ArrayView2<'_, T>, ArrayView2<'_, u8>)| {
            let (mut fg, mut bg) = (Acc::default(), Acc::default());
            for (v, l) in vol.iter().zip(lab.iter()) {
                let v = v.intensity();
                if *l == 1 {
                    fg.push(v);
                } else {
                    bg.push(v);
                }
            }
            (fg, bg)
        };

        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                let partial: Vec<(Acc, Acc)> = volume
                    .axis_iter(Axis(0))
                    .into_par_iter()
                    .zip(labels.axis_iter(Axis(0)).into_par_iter())
                    .map(per_slice)
                    .collect();
            } else {
                let partial: Vec<(Acc, Acc)> = volume
                    .axis_iter(Axis(0))
                    .zip(labels.axis_iter(Axis(0)))
                    .map(per_slice)
                    .collect();
            }
        }

        let (fg, bg) = partial
            .into_iter()
            .fold((Acc::default(), Acc::default()), |(f0, b0), (f1, b1)| {
                (f0.merge(f1), b0.merge(b1))
            });
        Ok(Self {
            foreground_mean: fg.mean(),
            background_mean: bg.mean(),
            foreground_variance: fg.variance(),
            background_variance: bg.variance(),
            foreground_count: fg.count,
            background_count: bg.count,
        })
    }

    /// 前景标准差.
    #[inline]
    pub fn foreground_std(&self) -> f64 {
        self.foreground_variance.sqrt()
    }

    /// 背景标准差.
    #[inline]
    pub fn background_std(&self) -> f64 {
        self.background_variance.sqrt()
    }

    /// 两个区域是否都非空?
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.foreground_count > 0 && self.background_count > 0
    }
}
