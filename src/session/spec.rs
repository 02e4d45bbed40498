//! 会话描述
//!
//! 会话参数来自一个 JSON 文件（命令行可以覆盖个别字段），
//! 选择五种测试动作之一并携带请求码等参数。

use serde::{Deserialize, Serialize};

/// 默认测试时长（毫秒）。
pub const DEFAULT_DURATION_MS: u64 = 240_000;
/// 默认轨迹抽取步长。
pub const DEFAULT_TRACE_INTERVAL: usize = 10;
/// 默认链路速率（bps）。
pub const DEFAULT_SPEED_BPS: u32 = 80_000;
/// 默认链路读超时（毫秒）。
pub const DEFAULT_TIMEOUT_MS: u64 = 2_000;

/// 一次测量会话的完整描述。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub action: SessionAction,
    /// 主请求码（不含回车；发送时由驱动补 '\r'）。
    pub request_code: String,
    /// 次级码：`image_gps` 的跟进请求码，`arq` 的 NACK 码。
    #[serde(default)]
    pub secondary_code: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub trace_interval: Option<usize>,
    /// 输出文件名里的图像集标识；缺省按动作取 E1/E2/M1。
    #[serde(default)]
    pub image_tag: Option<String>,
    #[serde(default)]
    pub speed_bps: Option<u32>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// 五种会话动作。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    Echo,
    Image,
    ImageNoisy,
    ImageGps,
    Arq,
}

impl SessionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionAction::Echo => "echo",
            SessionAction::Image => "image",
            SessionAction::ImageNoisy => "image_noisy",
            SessionAction::ImageGps => "image_gps",
            SessionAction::Arq => "arq",
        }
    }

    /// 动作默认的图像集标识。
    pub fn default_image_tag(self) -> Option<&'static str> {
        match self {
            SessionAction::Image => Some("E1"),
            SessionAction::ImageNoisy => Some("E2"),
            SessionAction::ImageGps => Some("M1"),
            SessionAction::Echo | SessionAction::Arq => None,
        }
    }
}

/// 会话结束后的机器可读结果摘要。
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acks_sent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nacks_sent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_bytes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traces_captured: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_len: Option<usize>,
}
