//! 种子初始化.

use super::{Intensity, LevelSet3d};
use crate::bands::{Band, NarrowBands};
use crate::consts::PhiTag;
use crate::phi::PhiField;
use crate::{Coord, LevelSetError, LsResult};
use itertools::iproduct;
use ndarray::{ArrayView2, ArrayView3, Axis};

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 裁剪后的立方体种子几何.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CubeGeometry {
    /// 左上角 (各分量最小) 坐标.
    pub corner: Coord,

    /// x, y 方向边长.
    pub size: usize,

    /// z 方向边长.
    pub height: usize,
}

/// 将 `c` 写为窄带成员. 仅当状态确实改变时追加到窄带.
#[inline]
fn add_to_band(phi: &PhiField, bands: &NarrowBands, c: Coord, band: Band) {
    let tag = match band {
        Band::Inner => PhiTag::InnerBoundary,
        Band::Outer => PhiTag::OuterBoundary,
    };
    if phi.swap(c, tag).is_some_and(|old| old != tag) {
        bands.push(band, c);
    }
}

/// 将 `[start, start + len)` 裁剪进 `[0, bound)`. 返回裁剪后的起点与负方向缩减量.
#[inline]
fn clamp_start(start: i32, bound: usize) -> (i32, usize) {
    let s = start.clamp(0, i32::try_from(bound).unwrap_or(i32::MAX));
    (s, (s as i64 - start as i64).max(0) as usize)
}

/// 球体种子的有效半径上限. 任意 `i32` 球心到任意场内体素的距离都小于该值,
/// 更大的半径与之等价.
const MAX_SPHERE_RADIUS: i64 = 1 << 35;

impl<'a, T: Intensity> LevelSet3d<'a, T> {
    /// 将整个 phi 场填充为 `tag`, 并清空两条窄带.
    pub fn initialize_phi(&mut self, tag: PhiTag) {
        self.phi.fill(tag);
        self.bands.clear();
    }

    /// 重置: phi 场全部为 `Exterior`, 两条窄带为空.
    #[inline]
    fn reset(&mut self) {
        self.initialize_phi(PhiTag::Exterior);
    }

    /// 检查立方体种子 `[x0, x0 + size) * [y0, y0 + size) * [z0, z0 + height)` 是否超出体数据.
    ///
    /// 返回裁剪后的几何, 以及几何是否保持不变. 负坐标被截断为 `0` 并相应缩短边长;
    /// `size` 同时收缩以适配 x 与 y 两个方向, `height` 收缩以适配 z 方向.
    pub fn check_initial_cube(
        &self,
        corner: Coord,
        size: usize,
        height: usize,
    ) -> (CubeGeometry, bool) {
        let (nz, ny, nx) = self.shape();
        let (x0, sx) = clamp_start(corner.x, nx);
        let (y0, sy) = clamp_start(corner.y, ny);
        let (z0, sz) = clamp_start(corner.z, nz);

        let fit = |start: i32, len: usize, bound: usize| len.min(bound - start as usize);
        let len = size.saturating_sub(sx.max(sy));
        let len = fit(x0, fit(y0, len, ny), nx);
        let h = fit(z0, height.saturating_sub(sz), nz);

        let geo = CubeGeometry {
            corner: Coord::new(x0, y0, z0),
            size: len,
            height: h,
        };
        (geo, len == size && h == height && geo.corner == corner)
    }

    /// 以立方体初始化. 外层表面为外窄带, 向内一层为内窄带, 其余为 `Interior`.
    ///
    /// 几何超出体数据时被静默裁剪. 若裁剪后的边长小于 3, 则返回 `Err`.
    pub fn initial_cube(&mut self, corner: Coord, size: usize, height: usize) -> LsResult<()> {
        let (geo, untouched) = self.check_initial_cube(corner, size, height);
        if !untouched {
            log::debug!("initial cube clamped: {corner:?}, {size}, {height} -> {geo:?}");
        }
        if geo.size < 3 || geo.height < 3 {
            return Err(LevelSetError::SeedTooSmall);
        }
        self.reset();

        let (len, h) = (geo.size as i32, geo.height as i32);
        let depth = |v: i32, n: i32| v.min(n - 1 - v);
        for (k, j, i) in iproduct!(0..h, 0..len, 0..len) {
            let c = geo.corner.offset(i, j, k);
            match depth(i, len).min(depth(j, len)).min(depth(k, h)) {
                0 => add_to_band(&self.phi, &self.bands, c, Band::Outer),
                1 => add_to_band(&self.phi, &self.bands, c, Band::Inner),
                _ => {
                    self.phi.swap(c, PhiTag::Interior);
                }
            }
        }
        log::debug!(
            "initial cube: inner = {}, outer = {}",
            self.bands.len(Band::Inner),
            self.bands.len(Band::Outer)
        );
        Ok(())
    }

    /// 以球体初始化. 球心 `center`, 半径 `radius`.
    ///
    /// 对包围盒内每个体素按距离平方 `d2` 分类: `d2 < (R - 1)^2` 为 `Interior`,
    /// `d2 < R^2` 为内窄带, `d2 < (R + 1)^2` 为外窄带. 体数据外的部分被静默裁剪.
    ///
    /// 若 `radius == 0` 或裁剪后没有任何内窄带点, 则返回 `Err`.
    pub fn initial_sphere(&mut self, radius: usize, center: Coord) -> LsResult<()> {
        if radius == 0 {
            return Err(LevelSetError::SeedTooSmall);
        }
        self.reset();

        let r = i64::try_from(radius)
            .unwrap_or(MAX_SPHERE_RADIUS)
            .min(MAX_SPHERE_RADIUS);
        let sq = |v: i64| (v as i128) * (v as i128);
        let (r_in, r_mid, r_out) = (sq(r - 1), sq(r), sq(r + 1));
        let (nz, ny, nx) = self.shape();
        let span = |c: i32, n: usize| {
            let lo = (c as i64 - r - 1).max(0);
            let hi = (c as i64 + r + 1).min(n as i64 - 1);
            lo as i32..=hi as i32
        };
        for (z, y, x) in iproduct!(span(center.z, nz), span(center.y, ny), span(center.x, nx)) {
            let c = Coord::new(x, y, z);
            let d2 = c.distance_squared(&center);
            if d2 < r_in {
                self.phi.swap(c, PhiTag::Interior);
            } else if d2 < r_mid {
                add_to_band(&self.phi, &self.bands, c, Band::Inner);
            } else if d2 < r_out {
                add_to_band(&self.phi, &self.bands, c, Band::Outer);
            }
        }

        if self.bands.len(Band::Inner) == 0 {
            log::debug!("initial sphere at {center:?} is outside of the volume");
            self.reset();
            return Err(LevelSetError::SeedTooSmall);
        }
        log::debug!(
            "initial sphere: inner = {}, outer = {}",
            self.bands.len(Band::Inner),
            self.bands.len(Band::Outer)
        );
        Ok(())
    }

    /// 以标签体数据中值为 `active` 的区域初始化.
    ///
    /// 统计每个体素 3x3x3 邻域 (含自身, 仅场内) 中激活体素的个数 `n`:
    ///
    /// 1. 激活体素, 若 `n < 8` 或存在非激活的场内 6-邻居, 则为内窄带, 否则为 `Interior`;
    /// 2. 非激活体素, 若 `n > 0`, 则为外窄带.
    ///
    /// 若 `labels` 形状与体数据不同, 则返回 `Err`.
    pub fn initialize_from_region(&mut self, labels: ArrayView3<u8>, active: u8) -> LsResult<()> {
        if labels.dim() != self.shape() {
            return Err(LevelSetError::ShapeMismatch(self.shape(), labels.dim()));
        }
        self.reset();

        let (phi, bands) = (&self.phi, &self.bands);
        let is_active = |c: Coord| {
            c.to_idx(labels.dim())
                .is_some_and(|idx| labels[idx] == active)
        };
        let per_slice = |(z, sli): (usize, ArrayView2<u8>)| {
            for ((y, x), v) in sli.indexed_iter() {
                let c = Coord::from_idx((z, y, x));
                let n = c.neighbours26().filter(|n| is_active(*n)).count()
                    + usize::from(*v == active);
                if *v == active {
                    let in_volume = |n: &Coord| n.to_idx(labels.dim()).is_some();
                    let exposed = c
                        .neighbours6()
                        .into_iter()
                        .filter(in_volume)
                        .any(|n| !is_active(n));
                    if n < 8 || exposed {
                        add_to_band(phi, bands, c, Band::Inner);
                    } else {
                        phi.swap(c, PhiTag::Interior);
                    }
                } else if n > 0 {
                    add_to_band(phi, bands, c, Band::Outer);
                }
            }
        };

        cfg_if::cfg_if! {
            if #[cfg(feature = "rayon")] {
                labels
                    .axis_iter(Axis(0))
                    .into_par_iter()
                    .enumerate()
                    .for_each(per_slice);
            } else {
                labels.axis_iter(Axis(0)).enumerate().for_each(per_slice);
            }
        }

        log::debug!(
            "initialize from region {active}: inner = {}, outer = {}",
            self.bands.len(Band::Inner),
            self.bands.len(Band::Outer)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::CubeGeometry;
    use crate::consts::{PhiTag, Velocity};
    use crate::engine::tests::assert_consistent;
    use crate::engine::LevelSet3d;
    use crate::{Coord, LevelSetConfig, LevelSetError};
    use ndarray::Array3;

    fn engine(vol: &Array3<f32>) -> LevelSet3d<'_, f32> {
        LevelSet3d::prepare_volumes(vol.view(), LevelSetConfig::default()).unwrap()
    }

    #[test]
    fn test_check_initial_cube() {
        let vol = Array3::<f32>::zeros((10, 12, 14)); // (z, y, x)
        let ls = engine(&vol);

        let (geo, ok) = ls.check_initial_cube(Coord::new(1, 1, 1), 5, 5);
        assert!(ok);
        assert_eq!(geo.size, 5);

        // y 方向超出: 边长同时作用于 x 和 y.
        let (geo, ok) = ls.check_initial_cube(Coord::new(0, 8, 0), 6, 4);
        assert!(!ok);
        assert_eq!(
            geo,
            CubeGeometry {
                corner: Coord::new(0, 8, 0),
                size: 4,
                height: 4
            }
        );

        // 负坐标被截断.
        let (geo, ok) = ls.check_initial_cube(Coord::new(-2, 0, 8), 6, 6);
        assert!(!ok);
        assert_eq!(geo.corner, Coord::new(0, 0, 8));
        assert_eq!((geo.size, geo.height), (4, 2));
    }

    #[test]
    fn test_initial_cube() {
        let vol = Array3::<f32>::zeros((10, 10, 10));
        let mut ls = engine(&vol);
        ls.initial_cube(Coord::new(2, 2, 2), 6, 6).unwrap();
        assert_consistent(&ls);

        // 外层 6^3 - 4^3, 内层 4^3 - 2^3, 内部 2^3.
        assert_eq!(ls.outer_band().len(), 216 - 64);
        assert_eq!(ls.inner_band().len(), 64 - 8);
        assert_eq!(ls.phi().count(PhiTag::Interior), 8);
        assert_eq!(ls.phi().count_foreground(), 64);
        assert_eq!(ls.phi().tag(Coord::new(2, 2, 2)), Some(PhiTag::OuterBoundary));
        assert_eq!(ls.phi().tag(Coord::new(4, 4, 4)), Some(PhiTag::Interior));

        // 重新初始化前会重置.
        ls.initial_cube(Coord::new(0, 0, 0), 3, 3).unwrap();
        assert_consistent(&ls);
        assert_eq!(ls.inner_band(), vec![Coord::new(1, 1, 1)]);
        assert_eq!(ls.phi().count_foreground(), 1);
    }

    #[test]
    fn test_initial_cube_too_small() {
        let vol = Array3::<f32>::zeros((10, 10, 10));
        let mut ls = engine(&vol);
        assert_eq!(
            ls.initial_cube(Coord::new(8, 0, 0), 5, 5),
            Err(LevelSetError::SeedTooSmall)
        );
        assert_eq!(
            ls.initial_cube(Coord::new(0, 0, 0), 5, 2),
            Err(LevelSetError::SeedTooSmall)
        );
    }

    /// 外层全部为背景, 内层全部为前景时, 立方体种子不再变化.
    #[test]
    fn test_initial_cube_is_stable() {
        let vol = Array3::<f32>::zeros((12, 12, 12));
        let mut ls = engine(&vol);
        ls.initial_cube(Coord::new(3, 3, 3), 6, 6).unwrap();
        let label = ls.phi().to_label(1, 0);
        ls.set_vf_from_region(label.view(), 1).unwrap();

        let (mut inner, mut outer) = (ls.inner_band(), ls.outer_band());
        assert_eq!(ls.outward_evolution(), 0);
        assert_eq!(ls.inward_evolution(), 0);
        let (mut inner2, mut outer2) = (ls.inner_band(), ls.outer_band());
        for v in [&mut inner, &mut outer, &mut inner2, &mut outer2] {
            v.sort();
        }
        assert_eq!(inner, inner2);
        assert_eq!(outer, outer2);
        assert_consistent(&ls);
    }

    #[test]
    fn test_initial_sphere() {
        let vol = Array3::<f32>::zeros((24, 24, 24));
        let mut ls = engine(&vol);
        let center = Coord::new(12, 11, 10);
        let r = 6i128;
        ls.initial_sphere(r as usize, center).unwrap();
        assert_consistent(&ls);

        for (c, tag) in ls.phi().indexed_iter() {
            let d2 = c.distance_squared(&center);
            if d2 < (r - 1) * (r - 1) {
                assert_eq!(tag, PhiTag::Interior);
            }
            if d2 > (r + 1) * (r + 1) {
                assert_eq!(tag, PhiTag::Exterior);
            }
        }
        // 内窄带每个点的 6-邻居都不是 `Exterior`, 外窄带每个点的 6-邻居都不是 `Interior`.
        for c in ls.inner_band() {
            assert!(c
                .neighbours6()
                .iter()
                .all(|n| ls.phi().tag(*n) != Some(PhiTag::Exterior)));
        }
        for c in ls.outer_band() {
            assert!(c
                .neighbours6()
                .iter()
                .all(|n| ls.phi().tag(*n) != Some(PhiTag::Interior)));
        }
    }

    #[test]
    fn test_initial_sphere_clamped() {
        let vol = Array3::<f32>::zeros((8, 8, 8));
        let mut ls = engine(&vol);
        ls.initial_sphere(4, Coord::new(0, 0, 0)).unwrap();
        assert_consistent(&ls);
        assert_eq!(ls.phi().tag(Coord::new(0, 0, 0)), Some(PhiTag::Interior));

        assert_eq!(
            ls.initial_sphere(0, Coord::new(4, 4, 4)),
            Err(LevelSetError::SeedTooSmall)
        );
        assert_eq!(
            ls.initial_sphere(2, Coord::new(40, 4, 4)),
            Err(LevelSetError::SeedTooSmall)
        );
        assert!(ls.inner_band().is_empty());
    }

    /// 极端几何被静默裁剪, 不会溢出.
    #[test]
    fn test_extreme_geometry() {
        let vol = Array3::<f32>::zeros((8, 8, 8));
        let mut ls = engine(&vol);

        let (geo, ok) = ls.check_initial_cube(Coord::new(i32::MIN, 0, 0), 5, 5);
        assert!(!ok);
        assert_eq!(geo.corner, Coord::new(0, 0, 0));
        assert_eq!(geo.size, 0);
        assert_eq!(
            ls.initial_cube(Coord::new(i32::MIN, 0, 0), 5, 5),
            Err(LevelSetError::SeedTooSmall)
        );
        assert_eq!(
            ls.initial_cube(Coord::new(i32::MAX, i32::MAX, i32::MAX), usize::MAX, usize::MAX),
            Err(LevelSetError::SeedTooSmall)
        );
        // 整个体数据都在球内, 没有边界.
        assert_eq!(
            ls.initial_sphere(4_000_000_000, Coord::new(4, 4, 4)),
            Err(LevelSetError::SeedTooSmall)
        );
        assert_eq!(
            ls.initial_sphere(usize::MAX, Coord::new(i32::MIN, i32::MIN, i32::MIN)),
            Err(LevelSetError::SeedTooSmall)
        );
        assert_eq!(ls.phi().count(PhiTag::Exterior), 512);

        // 球心远在体数据之外, 球面仍可穿过体数据.
        let far = 1_000_000_000usize;
        ls.initial_sphere(far + 4, Coord::new(-(far as i32), 4, 4)).unwrap();
        assert_consistent(&ls);
        assert_eq!(ls.phi().tag(Coord::new(0, 4, 4)), Some(PhiTag::Interior));
        assert_eq!(ls.phi().tag(Coord::new(7, 4, 4)), Some(PhiTag::Exterior));
    }

    #[test]
    fn test_initialize_from_region() {
        let mut labels = Array3::<u8>::zeros((8, 8, 8));
        labels
            .slice_mut(ndarray::s![2..6, 2..6, 2..6])
            .fill(2);
        let vol = Array3::<f32>::zeros((8, 8, 8));
        let mut ls = engine(&vol);
        ls.initialize_from_region(labels.view(), 2).unwrap();
        assert_consistent(&ls);

        // 表面 4^3 - 2^3, 内部 2^3, 外层为 26-膨胀 6^3 - 4^3.
        assert_eq!(ls.inner_band().len(), 56);
        assert_eq!(ls.phi().count(PhiTag::Interior), 8);
        assert_eq!(ls.outer_band().len(), 216 - 64);
        // 角点的邻域计数恰为 8, 但暴露在外, 因此属于内窄带.
        assert_eq!(ls.phi().tag(Coord::new(2, 2, 2)), Some(PhiTag::InnerBoundary));
        assert_eq!(ls.phi().tag(Coord::new(1, 1, 1)), Some(PhiTag::OuterBoundary));
        assert_eq!(ls.phi().tag(Coord::new(0, 0, 0)), Some(PhiTag::Exterior));

        let wrong = Array3::<u8>::zeros((8, 8, 7));
        assert_eq!(
            ls.initialize_from_region(wrong.view(), 2),
            Err(LevelSetError::ShapeMismatch((8, 8, 8), (8, 8, 7)))
        );
    }

    #[test]
    fn test_initialize_phi() {
        let vol = Array3::<f32>::zeros((4, 4, 4));
        let mut ls = engine(&vol);
        ls.initial_sphere(1, Coord::new(2, 2, 2)).unwrap();
        ls.initialize_phi(PhiTag::Interior);
        assert_eq!(ls.phi().count_foreground(), 64);
        assert_eq!(ls.boundary_points_count(), 0);
        assert_eq!(ls.velocity().get(Coord::new(0, 0, 0)), Some(Velocity::Unknown));
    }
}
