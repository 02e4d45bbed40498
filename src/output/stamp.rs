//! 时间戳格式化
//!
//! 输出文件与日志里程碑统一使用 `yyyy-MM-dd-HH-mm-ss-SSS`（UTC）。

use std::time::{SystemTime, UNIX_EPOCH};

/// 当前时刻的时间戳字符串。
pub fn timestamp() -> String {
    let ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    format_epoch_millis(ms)
}

/// 把 UNIX 毫秒格式化为 `yyyy-MM-dd-HH-mm-ss-SSS`。
pub fn format_epoch_millis(ms: u64) -> String {
    let millis = ms % 1_000;
    let secs = ms / 1_000;
    let (hour, minute, second) = (secs / 3_600 % 24, secs / 60 % 60, secs % 60);
    let (year, month, day) = civil_from_days((secs / 86_400) as i64);
    format!("{year:04}-{month:02}-{day:02}-{hour:02}-{minute:02}-{second:02}-{millis:03}")
}

/// 公历换算：以 400 年（146097 天）为一个纪元。
fn civil_from_days(z: i64) -> (i64, u32, u32) {
    let z = z + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = z - era * 146_097; // [0, 146096]
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365; // [0, 399]
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11]
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32; // [1, 31]
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32; // [1, 12]
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
