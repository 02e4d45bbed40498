//! 会话错误类型
//!
//! 分三类：链路传输错误（中止当前测试）、响应格式错误（定长字段缺失或
//! 无法解析，显式上报而不是越界崩溃）、输出资源错误（报告后继续）。

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// 链路写失败。
    #[error("link write failed while sending {what}")]
    WriteFailed { what: &'static str },

    /// 字节流在读到预期标记之前结束。
    #[error("stream ended before {expected}")]
    StreamEnded { expected: &'static str },

    /// 响应太短，容不下定长字段。
    #[error("response too short for {field}: offset {offset} width {width}, got {len} chars")]
    MissingField {
        field: &'static str,
        offset: usize,
        width: usize,
        len: usize,
    },

    /// 定长字段不是十进制数。
    #[error("field {field} is not decimal: {raw:?}")]
    BadNumber { field: &'static str, raw: String },

    /// 输出文件读写失败。
    #[error("output file {} failed", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SessionError {
    /// 传输类：立即中止当前测试回合，不做传输层重试。
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SessionError::WriteFailed { .. } | SessionError::StreamEnded { .. }
        )
    }

    /// 格式类：定长字段缺失或无法解析。
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            SessionError::MissingField { .. } | SessionError::BadNumber { .. }
        )
    }
}
