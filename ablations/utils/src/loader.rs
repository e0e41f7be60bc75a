//! 对 `ls_berry::data` 的更一层封装. 从环境变量给出的路径加载 NIfTI 数据.

use ls_berry::{CtLabel, CtScan, OpenError};
use std::env;
use std::path::PathBuf;

/// 扫描数据路径对应的环境变量.
pub const SCAN_ENV: &str = "LS_SCAN_PATH";

/// 标签数据路径对应的环境变量.
pub const LABEL_ENV: &str = "LS_LABEL_PATH";

fn path_from_env(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// 若 `$LS_SCAN_PATH` 与 `$LS_LABEL_PATH` 均非空, 则加载二者.
/// 否则返回 `None`.
pub fn scan_and_label_from_env() -> Option<Result<(CtScan, CtLabel), OpenError>> {
    let scan = path_from_env(SCAN_ENV)?;
    let label = path_from_env(LABEL_ENV)?;
    Some(CtScan::open(scan).and_then(|s| Ok((s, CtLabel::open(label)?))))
}
