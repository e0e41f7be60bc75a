#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供基于窄带 (narrow band) 水平集的 3D CT 体数据分割引擎.
//!
//! 隐式曲面以四状态 phi 场表示, 只维护界面两侧各一层边界点 (内窄带与外窄带).
//! 每一步演化根据速度场 (逐体素的前景/背景分类) 决定哪些边界点翻转,
//! 并周期性地以高斯核平滑界面.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 体数据一律按照 `(z, y, x)` 索引, 与 `ndarray` 保持一致;
//!   而 [`Coord`] 按照 `(x, y, z)` 书写.
//! 2. 越界访问不会 panic: 读取得到 `None`, 写入为空操作.
//! 3. 前置条件不满足时 (例如尚未初始化种子就开始演化), 返回 [`LevelSetError`].
//!
//! # 开发计划
//!
//! ### 四状态 phi 场与两条窄带 ✅
//!
//! 每个体素的状态以原子量保存, "加入窄带" 操作以原子交换实现,
//! 只有观察到状态改变的工作线程才追加到窄带, 因此窄带中不会出现重复点.
//!
//! 实现位于 `ls-berry/src/phi.rs` 与 `ls-berry/src/bands.rs`.
//!
//! ### 速度场 ✅
//!
//! 1. 均值分离 / 均值 + 方差分离 ✅
//! 2. 由标签体数据直接给出 ✅
//! 3. 自定义分类器, 含惰性求值与 26-邻域多数表决 ✅
//!
//! 实现位于 `ls-berry/src/velocity.rs` 与 `ls-berry/src/engine/vf.rs`.
//!
//! ### 种子初始化 ✅
//!
//! 立方体, 球体, 以及标签区域. 球体种子以精确的距离平方分层,
//! 保证内外窄带之间恰好相隔一个 6-邻域步长.
//!
//! 实现位于 `ls-berry/src/engine/init.rs`.
//!
//! ### 演化与平滑 ✅
//!
//! 遍历窄带时先取出快照, 并行处理后再统一压缩. 平滑分为 "决策" 与 "翻转" 两个阶段,
//! 结果与线程调度无关.
//!
//! 实现位于 `ls-berry/src/engine/evolution.rs`.
//!
//! ### 均值 + 方差分类器的判别式 ⌛️
//!
//! 当前判别式与教科书对数似然比存在两处差异 (线性项系数与对数项),
//! 需要在参考数据上对比后再决定是否修正. 见 [`velocity::mean_variance_separation`].
//!
//! ### 完善代码文档 ✅
//!
//! 给每个 public API 提供文档, 并视情况给 private
//! API 提供文档.

/// 三维索引 `(z, y, x)`, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 本 crate 的运行时结果.
pub type LsResult<T> = Result<T, LevelSetError>;

mod bands;
mod coord;
mod error;
mod stats;

pub mod config;
pub mod consts;
pub mod data;
pub mod engine;
pub mod kernel;
pub mod phi;
pub mod prelude;
pub mod velocity;

pub use bands::Band;
pub use config::{LevelSetConfig, SmoothingSpec};
pub use consts::{PhiTag, Velocity};
pub use coord::Coord;
pub use data::{CtLabel, CtScan, OpenError};
pub use engine::{CubeGeometry, Intensity, LevelSet3d};
pub use error::LevelSetError;
pub use kernel::GaussKernel;
pub use phi::PhiField;
pub use stats::RegionStatistics;
pub use velocity::VelocityField;
