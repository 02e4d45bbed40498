//! 测量样本输出
//!
//! 每个测试持有自己的 CSV 文件，一行一个整数；文件在测试结束
//! （含错误路径）时随 Drop 关闭。打开失败退化为丢弃写入：
//! 只告警，不中断测试。

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use super::stamp;

/// 一行一个整数的样本输出。
#[derive(Debug)]
pub struct SampleWriter {
    path: PathBuf,
    file: Option<BufWriter<File>>,
}

impl SampleWriter {
    /// 在 `dir` 下创建 `<prefix>_<时间戳>.csv`。
    pub fn create(dir: &Path, prefix: &str) -> SampleWriter {
        let path = dir.join(format!("{prefix}_{}.csv", stamp::timestamp()));
        let file = match fs::create_dir_all(dir).and_then(|_| File::create(&path)) {
            Ok(f) => Some(BufWriter::new(f)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "样本文件创建失败，样本将被丢弃");
                None
            }
        };
        SampleWriter { path, file }
    }

    /// 追加一个样本。
    pub fn record(&mut self, value: u64) {
        let Some(file) = &mut self.file else { return };
        if let Err(e) = writeln!(file, "{value}") {
            warn!(path = %self.path.display(), error = %e, "样本写入失败");
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SampleWriter {
    fn drop(&mut self) {
        if let Some(file) = &mut self.file {
            if let Err(e) = file.flush() {
                warn!(path = %self.path.display(), error = %e, "样本文件刷新失败");
            }
        }
    }
}
