//! 三维高斯平滑核.

use crate::{LevelSetError, LsResult};
use ndarray::Array3;
use std::f64::consts::TAU;

/// 预计算的三维高斯卷积核. 构建后只读.
///
/// 核函数为
///
/// ```text
///                         1                         (x^2 + y^2 + z^2)
///   G_sigma(x,y,z) = ---------------------- * exp(- -----------------)
///                    (2 * pi)^3/2 * sigma^3            2 * sigma^2
/// ```
///
/// 权重未做归一化, 平滑时只关心卷积结果的符号.
#[derive(Debug, Clone)]
pub struct GaussKernel {
    /// 以 `(dz, dy, dx) + half` 为索引.
    weights: Array3<f64>,
    half: usize,
    sigma: f64,
}

impl GaussKernel {
    /// 构建边长为 `size` 的核.
    ///
    /// `size` 必须为正奇数, `sigma` 必须为正有限值, 否则返回 `Err`.
    pub fn new(size: usize, sigma: f64) -> LsResult<Self> {
        if size % 2 == 0 || !(sigma.is_finite() && sigma > 0.0) {
            return Err(LevelSetError::InvalidKernel(size, sigma));
        }
        let half = size / 2;

        let a = TAU.powf(-1.5) / sigma.powi(3);
        let b = -0.5 / (sigma * sigma);
        let weights = Array3::from_shape_fn((size, size, size), |(k, j, i)| {
            let d2 = [i, j, k]
                .into_iter()
                .map(|v| (v as f64 - half as f64).powi(2))
                .sum::<f64>();
            a * (b * d2).exp()
        });
        Ok(Self {
            weights,
            half,
            sigma,
        })
    }

    /// 边长.
    #[inline]
    pub fn size(&self) -> usize {
        2 * self.half + 1
    }

    /// 半宽 (`size / 2`).
    #[inline]
    pub fn half(&self) -> usize {
        self.half
    }

    /// 标准差.
    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// 相对中心偏移为 `(dx, dy, dz)` 处的权重. 超出核范围时返回 `None`.
    #[inline]
    pub fn weight(&self, dx: i32, dy: i32, dz: i32) -> Option<f64> {
        let h = self.half as i32;
        let idx = |d: i32| usize::try_from(d + h).ok();
        self.weights.get((idx(dz)?, idx(dy)?, idx(dx)?)).copied()
    }

    /// 迭代所有 `((dx, dy, dz), weight)`.
    pub fn taps(&self) -> impl Iterator<Item = ((i32, i32, i32), f64)> + '_ {
        let h = self.half as i32;
        self.weights
            .indexed_iter()
            .map(move |((k, j, i), w)| ((i as i32 - h, j as i32 - h, k as i32 - h), *w))
    }
}

#[cfg(test)]
mod tests {
    use super::GaussKernel;
    use crate::LevelSetError;

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_kernel_invalid() {
        assert_eq!(
            GaussKernel::new(4, 1.0).unwrap_err(),
            LevelSetError::InvalidKernel(4, 1.0)
        );
        assert!(GaussKernel::new(0, 1.0).is_err());
        assert!(GaussKernel::new(3, 0.0).is_err());
        assert!(GaussKernel::new(3, f64::NAN).is_err());
    }

    #[test]
    fn test_kernel_shape() {
        let k = GaussKernel::new(5, 1.5).unwrap();
        assert_eq!(k.size(), 5);
        assert_eq!(k.half(), 2);
        assert_eq!(k.taps().count(), 125);
        assert_eq!(k.weight(3, 0, 0), None);
        assert!(k.weight(-2, -2, -2).is_some());
    }

    /// 中心最大, 关于各轴对称, 随距离单调递减.
    #[test]
    fn test_kernel_symmetry() {
        let k = GaussKernel::new(3, 1.0).unwrap();
        let w0 = k.weight(0, 0, 0).unwrap();
        let w1 = k.weight(1, 0, 0).unwrap();
        let w2 = k.weight(1, 1, 0).unwrap();
        let w3 = k.weight(1, 1, 1).unwrap();
        assert!(w0 > w1 && w1 > w2 && w2 > w3);

        for (d, w) in k.taps() {
            let (x, y, z) = d;
            assert!(f64_eq(w, k.weight(-x, y, z).unwrap()));
            assert!(f64_eq(w, k.weight(y, x, z).unwrap()));
            assert!(f64_eq(w, k.weight(z, y, x).unwrap()));
        }

        // G(0) = (2 pi)^-1.5 / sigma^3
        assert!(f64_eq(w0, std::f64::consts::TAU.powf(-1.5)));
        assert!(f64_eq(w1 / w0, (-0.5f64).exp()));
    }
}
