//! 定长字段布局
//!
//! 远端响应里的字段位置不是自描述的，而是协议常量；
//! 这里用「名字 + 偏移 + 宽度」集中描述，便于单测与整体替换。

use crate::session::SessionError;

/// 一个按字符偏移定位的定长字段。
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
}

impl FieldSpec {
    pub const fn new(name: &'static str, offset: usize, width: usize) -> FieldSpec {
        FieldSpec {
            name,
            offset,
            width,
        }
    }

    /// 从响应文本取出该字段；响应太短返回格式错误而不是越界。
    pub fn extract<'a>(&self, text: &'a str) -> Result<&'a str, SessionError> {
        text.get(self.offset..self.offset + self.width)
            .ok_or(SessionError::MissingField {
                field: self.name,
                offset: self.offset,
                width: self.width,
                len: text.len(),
            })
    }

    /// 取出字段并按十进制解析。
    pub fn extract_u32(&self, text: &str) -> Result<u32, SessionError> {
        let raw = self.extract(text)?;
        raw.parse().map_err(|_| SessionError::BadNumber {
            field: self.name,
            raw: raw.to_string(),
        })
    }
}

/// ARQ 响应：16 字符载荷字段。
pub const ARQ_PAYLOAD: FieldSpec = FieldSpec::new("arq payload", 31, 16);
/// ARQ 响应：3 位十进制校验和字段（与载荷末尾隔两个字符）。
pub const ARQ_FCS: FieldSpec = FieldSpec::new("arq fcs", 49, 3);

/// GPGGA 轨迹：纬度度/分字段对。
pub const GPS_LAT_DEG: FieldSpec = FieldSpec::new("gps lat degrees", 31, 4);
pub const GPS_LAT_MIN: FieldSpec = FieldSpec::new("gps lat minutes", 36, 4);
/// GPGGA 轨迹：经度度/分字段对。
pub const GPS_LON_DEG: FieldSpec = FieldSpec::new("gps lon degrees", 18, 4);
pub const GPS_LON_MIN: FieldSpec = FieldSpec::new("gps lon minutes", 23, 4);

/// 远端坐标码的分值缩放常量。
pub const GPS_MINUTE_SCALE: f64 = 0.006;
