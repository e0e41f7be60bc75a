//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Coord, Idx3d, LsResult};

pub use crate::config::{LevelSetConfig, SmoothingSpec};
pub use crate::consts::{PhiTag, Velocity, STOP_RATIO};
pub use crate::data::{CtLabel, CtScan};
pub use crate::engine::{Intensity, LevelSet3d};
pub use crate::error::LevelSetError;
pub use crate::stats::RegionStatistics;
