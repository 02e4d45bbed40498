//! 输出文件
//!
//! 测量结果文件统一带标识与时间戳命名：CSV 一行一个整数，
//! 图像为原始字节。资源错误只报告，不中断协议流程。

mod csv;
mod stamp;

pub use csv::SampleWriter;
pub use stamp::{format_epoch_millis, timestamp};

use std::fs;
use std::path::{Path, PathBuf};

use crate::session::SessionError;

/// 把重建后的图像字节写入 `dir/<tag>_<时间戳>.jpg`。
pub fn write_image(dir: &Path, tag: &str, bytes: &[u8]) -> Result<PathBuf, SessionError> {
    let path = dir.join(format!("{tag}_{}.jpg", stamp::timestamp()));
    fs::create_dir_all(dir)
        .and_then(|_| fs::write(&path, bytes))
        .map_err(|source| SessionError::Output {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}
