//! 链路抽象
//!
//! 定义到远端实验服务器的字节链路接口，以及基于 TCP 的实现。
//! 链路只负责字节进出；协议语义全部在 `probe` 层。

mod reader;
mod tcp;

pub use reader::{StreamReader, TailWindow};
pub use tcp::TcpLink;

use std::io;

/// 字节链路。
///
/// `read` 的约定：`Ok(Some(b))` 读到一个字节；`Ok(None)` 流结束（含读超时）；
/// `Err` 为读故障。写失败用返回值表达；重试与否由驱动测试的上层决定。
pub trait Link {
    /// 以会话名打开链路。
    fn open(&mut self, session_name: &str) -> io::Result<()>;
    /// 关闭链路；调用方应重试直到返回 true。
    fn close(&mut self) -> bool;
    /// 设置链路速率（bps）。
    fn set_speed(&mut self, bps: u32);
    /// 设置读超时（毫秒）。
    fn set_timeout(&mut self, ms: u64);
    /// 写出字节，返回是否成功。
    fn write(&mut self, bytes: &[u8]) -> bool;
    /// 读一个字节。
    fn read(&mut self) -> io::Result<Option<u8>>;
}
