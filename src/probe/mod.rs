//! 测量会话（探测）模块
//!
//! 四种测试共用同一条链路与会话日志：回显时延、ARQ 重传、
//! 图像下载、GPS 轨迹提取。每个测试独占链路直到自身的停止条件。

mod arq;
mod echo;
pub mod fields;
mod gps;
mod image;

pub use arq::{ArqReport, ArqTest, xor_checksum};
pub use echo::{EchoReport, EchoTest};
pub use gps::{GpsReport, GpsTraceExtractor, SENTENCE_PREFIX, TRACKING_STOP};
pub use image::{EOI_MARKER, ImageDownload, ImageReport, SOI_MARKER};

/// 远端每个逻辑响应的结束标记。
pub const RESPONSE_STOP: &str = "PSTOP";
