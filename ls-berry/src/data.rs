//! nii 格式 3D CT 扫描与标注的读取.

use std::fmt;
use std::ops::Index;
use std::path::Path;

use ndarray::{Array3, ArrayView3, ArrayViewMut3, Ix3, ShapeError};
use nifti::{IntoNdArray, NiftiError, NiftiHeader, NiftiObject, ReaderOptions};

use crate::Idx3d;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 读取体数据文件时的错误.
#[derive(Debug)]
pub enum OpenError {
    /// nifti 解析失败.
    Nifti(NiftiError),

    /// 数据不是三维体数据.
    Shape(ShapeError),
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nifti(e) => write!(f, "nifti 文件读取失败: {e}"),
            Self::Shape(e) => write!(f, "体数据形状非法: {e}"),
        }
    }
}

impl std::error::Error for OpenError {}

impl From<NiftiError> for OpenError {
    fn from(e: NiftiError) -> Self {
        Self::Nifti(e)
    }
}

impl From<ShapeError> for OpenError {
    fn from(e: ShapeError) -> Self {
        Self::Shape(e)
    }
}

/// 生成读取 nii 文件的函数, 并将 `[W, H, z]` 转换成 `(z, H, W)`. 以后均按照该模式访问.
macro_rules! read_volume_fn {
    ($name:ident, $t:ty) => {
        fn $name(path: &Path) -> Result<(BoxedHeader, Array3<$t>), OpenError> {
            let obj = ReaderOptions::new().read_file(path)?;
            let header = Box::new(obj.header().clone());

            // hint: 原第一维向下增长, 原第二维向右增长.
            let data = obj
                .into_volume()
                .into_ndarray::<$t>()?
                .permuted_axes([2, 1, 0].as_slice())
                .into_dimensionality::<Ix3>()?;

            // 转置后即为行优先布局, 这里不会再发生拷贝.
            Ok((header, data.as_standard_layout().into_owned()))
        }
    };
}

read_volume_fn!(read_scan, f32);
read_volume_fn!(read_label, u8);

/// 3D CT 扫描. HU 值以 `f32` 保存, 按 `(z, H, W)` 组织.
#[derive(Debug, Clone)]
pub struct CtScan {
    header: Option<BoxedHeader>,
    data: Array3<f32>,
}

impl CtScan {
    /// 打开 nii 文件格式的 3D CT 扫描. `path` 为 nii 文件的本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, OpenError> {
        let (header, data) = read_scan(path.as_ref())?;
        Ok(Self {
            header: Some(header),
            data,
        })
    }

    /// 由内存中的 `(z, H, W)` 数据直接创建, 不携带 header.
    pub fn from_array(data: Array3<f32>) -> Self {
        Self { header: None, data }
    }

    /// nii header. 由 [`CtScan::from_array`] 创建时为 `None`.
    #[inline]
    pub fn header(&self) -> Option<&NiftiHeader> {
        self.header.as_deref()
    }

    /// 数据形状 `(z, H, W)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut3<'_, f32> {
        self.data.view_mut()
    }
}

impl Index<Idx3d> for CtScan {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

/// 3D CT 标注. 标签值以 `u8` 保存, 按 `(z, H, W)` 组织.
#[derive(Debug, Clone)]
pub struct CtLabel {
    header: Option<BoxedHeader>,
    data: Array3<u8>,
}

impl CtLabel {
    /// 打开 nii 文件格式的 3D CT 标注. `path` 为 nii 文件的本地路径. 如果打开成功,
    /// 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, OpenError> {
        let (header, data) = read_label(path.as_ref())?;
        Ok(Self {
            header: Some(header),
            data,
        })
    }

    /// 由内存中的 `(z, H, W)` 标签直接创建, 不携带 header.
    pub fn from_array(data: Array3<u8>) -> Self {
        Self { header: None, data }
    }

    /// nii header. 由 [`CtLabel::from_array`] 创建时为 `None`.
    #[inline]
    pub fn header(&self) -> Option<&NiftiHeader> {
        self.header.as_deref()
    }

    /// 数据形状 `(z, H, W)`.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 值为 `label` 的体素个数.
    pub fn count(&self, label: u8) -> usize {
        self.data.iter().filter(|v| **v == label).count()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }

    /// 获得数据的一份可变 shallow copy.
    #[inline]
    pub fn data_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        self.data.view_mut()
    }
}

impl Index<Idx3d> for CtLabel {
    type Output = u8;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

#[cfg(test)]
mod tests {
    use super::{CtLabel, CtScan};
    use ndarray::Array3;

    #[test]
    fn test_from_array() {
        let scan = CtScan::from_array(Array3::from_elem((2, 3, 4), -1000.0));
        assert_eq!(scan.shape(), (2, 3, 4));
        assert!(scan.header().is_none());
        assert_eq!(scan[(1, 2, 3)], -1000.0);

        let mut label = CtLabel::from_array(Array3::zeros((2, 3, 4)));
        label.data_mut()[(0, 0, 0)] = 1;
        label.data_mut()[(1, 1, 1)] = 1;
        assert_eq!(label.count(1), 2);
        assert_eq!(label.count(0), 22);
        assert_eq!(label.data().dim(), scan.data().dim());
    }

    #[test]
    fn test_open_missing_file() {
        assert!(CtScan::open("/nonexistent/volume.nii.gz").is_err());
        assert!(CtLabel::open("/nonexistent/label.nii").is_err());
    }
}
