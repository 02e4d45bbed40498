//! 字节流读取
//!
//! 从链路逐字节拉取；读故障先记日志，再按流结束上报。
//! 本层不做任何自动重试；重试是协议层（ARQ）的概念。

use std::collections::VecDeque;

use tracing::{debug, warn};

use super::Link;

/// 逐字节流读取器。
pub struct StreamReader<'a> {
    link: &'a mut dyn Link,
}

impl<'a> StreamReader<'a> {
    pub fn new(link: &'a mut dyn Link) -> StreamReader<'a> {
        StreamReader { link }
    }

    /// 读下一个字节；`None` 表示流结束（读故障已记日志后同样按流结束处理）。
    pub fn next_byte(&mut self) -> Option<u8> {
        match self.link.read() {
            Ok(Some(b)) => Some(b),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "链路读故障，按流结束处理");
                None
            }
        }
    }

    /// 累积响应文本直到后缀命中 `stop` 标记；流先结束则返回 `None`。
    pub fn read_packet(&mut self, stop: &str) -> Option<String> {
        let mut packet = String::new();
        loop {
            let b = self.next_byte()?;
            packet.push(char::from(b));
            if packet.ends_with(stop) {
                debug!(len = packet.len(), "响应读取完成");
                return Some(packet);
            }
        }
    }
}

/// 有界的滚动后缀窗口。
///
/// 用于不保留全量缓冲的场景（如欢迎横幅）里检测停止标记；
/// 窗口容量必须不小于标记长度。
#[derive(Debug)]
pub struct TailWindow {
    cap: usize,
    buf: VecDeque<u8>,
}

impl TailWindow {
    pub fn new(cap: usize) -> TailWindow {
        TailWindow {
            cap: cap.max(1),
            buf: VecDeque::with_capacity(cap.max(1)),
        }
    }

    pub fn push(&mut self, byte: u8) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(byte);
    }

    /// 当前窗口是否以 `marker` 结尾。
    pub fn ends_with(&self, marker: &[u8]) -> bool {
        if marker.len() > self.buf.len() {
            return false;
        }
        self.buf
            .iter()
            .skip(self.buf.len() - marker.len())
            .copied()
            .eq(marker.iter().copied())
    }
}
