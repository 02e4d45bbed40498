//! GPS 轨迹提取
//!
//! 每遇到 '$' 就重新累积一条语句；完整的 GPGGA 语句按序收集，
//! 读到固定停止短语（或流结束）后进入抽取阶段：按配置步长抽取
//! 轨迹，把经纬度定长字段合成回传给远端的坐标码。

use tracing::{debug, info};

use crate::link::{Link, StreamReader};
use crate::output;
use crate::session::{SessionError, SessionLog};

use super::fields::{GPS_LAT_DEG, GPS_LAT_MIN, GPS_LON_DEG, GPS_LON_MIN, GPS_MINUTE_SCALE};

/// 轨迹语句类型前缀。
pub const SENTENCE_PREFIX: &str = "$GPGGA";
/// 远端轨迹流的结束短语。
pub const TRACKING_STOP: &str = "STOP ITHAKI GPS TRACKING";

/// GPS 轨迹提取参数。
#[derive(Debug, Clone)]
pub struct GpsTraceExtractor {
    /// 抽取步长：选取第 0, N, 2N, … 条轨迹。
    pub interval: usize,
}

/// 提取结果。
#[derive(Debug, Default)]
pub struct GpsReport {
    /// 捕获到的全部轨迹（原文）。
    pub traces: Vec<String>,
    /// 被抽取轨迹合成的回传码。
    pub follow_up: String,
}

impl GpsTraceExtractor {
    pub fn run(
        &self,
        link: &mut dyn Link,
        log: &mut SessionLog,
    ) -> Result<GpsReport, SessionError> {
        log.append(&format!("\nGet GPS traces ({})\n", output::timestamp()));
        info!(interval = self.interval, "▶️  开始提取 GPS 轨迹");
        let mut report = GpsReport {
            traces: collect_traces(link),
            follow_up: String::new(),
        };
        debug!(count = report.traces.len(), "轨迹捕获结束");

        // 步长为 0 会原地踏步，按 1 处理
        let step = self.interval.max(1);
        let mut selected: u64 = 0;
        let mut index = 0;
        while index < report.traces.len() {
            let trace = &report.traces[index];
            log.append(trace);
            report.follow_up.push_str(&coordinate_fragment(trace)?);
            selected += 1;
            index += step;
        }
        info!(selected, follow_up = %report.follow_up, "✅ 坐标码合成完成");
        Ok(report)
    }
}

/// 读取轨迹流：'$' 重置累积缓冲，完整 GPGGA 语句入列，停止短语收尾。
/// 流结束时带着已捕获的轨迹返回。
fn collect_traces(link: &mut dyn Link) -> Vec<String> {
    let mut traces = Vec::new();
    let mut current = String::new();
    let mut reader = StreamReader::new(link);
    loop {
        let Some(b) = reader.next_byte() else {
            return traces;
        };
        if b == b'$' {
            current.clear();
        }
        current.push(char::from(b));
        if current.starts_with(SENTENCE_PREFIX) && current.ends_with('\n') {
            traces.push(current.clone());
        } else if current.ends_with(TRACKING_STOP) {
            return traces;
        }
    }
}

/// 从一条轨迹合成 `T=…` 坐标码片段；分值按协议常量取整缩放。
pub(crate) fn coordinate_fragment(trace: &str) -> Result<String, SessionError> {
    let lat_deg = GPS_LAT_DEG.extract(trace)?;
    let lat_min = GPS_LAT_MIN.extract_u32(trace)?;
    let lon_deg = GPS_LON_DEG.extract(trace)?;
    let lon_min = GPS_LON_MIN.extract_u32(trace)?;
    let lat_scaled = (f64::from(lat_min) * GPS_MINUTE_SCALE).round() as i64;
    let lon_scaled = (f64::from(lon_min) * GPS_MINUTE_SCALE).round() as i64;
    Ok(format!("T={lat_deg}{lat_scaled}{lon_deg}{lon_scaled}"))
}
