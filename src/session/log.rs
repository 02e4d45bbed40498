//! 会话日志
//!
//! 一次会话在共享日志文件末尾追加一个由横幅首尾包围的文本块。
//! 缓冲超过阈值时提前落盘，长测试不会让内存无界增长；
//! 落盘失败只告警，内容留在缓冲里，不会在持久化之前丢失。

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::output;

/// 缓冲落盘阈值（字节）。
const SPILL_BYTES: usize = 64 * 1024;

const TRAILER: &str = "\n-------------------------END-------------------------\n\n\n\n";

/// 会话日志块。
#[derive(Debug)]
pub struct SessionLog {
    path: PathBuf,
    pending: String,
}

impl SessionLog {
    /// 开启一个新的会话日志块，首横幅带当前时间戳。
    pub fn new(path: impl Into<PathBuf>) -> SessionLog {
        SessionLog {
            path: path.into(),
            pending: format!(
                "-------------------------[{}]-------------------------\n",
                output::timestamp()
            ),
        }
    }

    /// 原样追加文本；超过阈值时尝试提前落盘。
    pub fn append(&mut self, text: &str) {
        self.pending.push_str(text);
        if self.pending.len() >= SPILL_BYTES {
            self.spill();
        }
    }

    /// 尚未落盘的缓冲内容。
    pub fn snapshot(&self) -> &str {
        &self.pending
    }

    /// 把剩余内容连同固定尾横幅追加到共享日志文件并清空缓冲。
    /// 失败只告警，会话照常收尾。
    pub fn persist(&mut self) {
        self.pending.push_str(TRAILER);
        self.spill();
        debug!(path = %self.path.display(), "会话日志已持久化");
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn spill(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| f.write_all(self.pending.as_bytes()));
        match result {
            Ok(()) => self.pending.clear(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "会话日志落盘失败，内容保留在缓冲");
            }
        }
    }
}
