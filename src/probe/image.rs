//! 图像下载
//!
//! 捕获阶段逐字节累积，直到末尾两个字节等于图像结束标记；
//! 重建阶段丢弃首个图像起始标记之前的所有字节（协议封皮与噪声），
//! 其余按序写入文件。没有起始标记就不产出文件。

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::link::{Link, StreamReader};
use crate::output;
use crate::session::{SessionError, SessionLog};

/// 图像起始标记（SOI）。
pub const SOI_MARKER: [u8; 2] = [0xFF, 0xD8];
/// 图像结束标记（EOI）。
pub const EOI_MARKER: [u8; 2] = [0xFF, 0xD9];

/// 图像下载参数。
#[derive(Debug, Clone)]
pub struct ImageDownload {
    /// 输出文件名里的图像集标识。
    pub tag: String,
}

/// 图像下载结果。
#[derive(Debug, Default)]
pub struct ImageReport {
    pub bytes_captured: usize,
    /// 捕获是否以 EOI 收尾（而不是流提前结束）。
    pub complete: bool,
    pub file: Option<PathBuf>,
}

impl ImageDownload {
    pub fn run(
        &self,
        link: &mut dyn Link,
        log: &mut SessionLog,
        out_dir: &Path,
    ) -> Result<ImageReport, SessionError> {
        log.append(&format!(
            "\nStart downloading image {} ({})\n",
            self.tag,
            output::timestamp()
        ));
        info!(tag = %self.tag, "▶️  开始图像下载");

        let mut report = ImageReport::default();
        let buffer = capture(link, &mut report);
        report.bytes_captured = buffer.len();
        log.append(&format!(
            "\nFinished downloading image {} ({})\n",
            self.tag,
            output::timestamp()
        ));

        // 重建：从首个 SOI 起写文件
        let Some(start) = find_soi(&buffer) else {
            warn!(tag = %self.tag, bytes = buffer.len(), "捕获数据中没有图像起始标记，不产出文件");
            log.append("\nNo start-of-image marker found, image skipped\n");
            return Ok(report);
        };
        let path = output::write_image(out_dir, &self.tag, &buffer[start..])?;
        log.append(&format!(
            "\nFinished creating image {} ({})\n",
            self.tag,
            output::timestamp()
        ));
        info!(
            tag = %self.tag,
            bytes = buffer.len() - start,
            path = %path.display(),
            "✅ 图像已写出"
        );
        report.file = Some(path);
        Ok(report)
    }
}

/// 捕获到 EOI 或流结束为止；流提前结束只告警，保留已捕获内容。
fn capture(link: &mut dyn Link, report: &mut ImageReport) -> Vec<u8> {
    let mut buffer = Vec::new();
    let mut reader = StreamReader::new(link);
    loop {
        let Some(b) = reader.next_byte() else {
            warn!(bytes = buffer.len(), "流在图像结束标记之前结束");
            return buffer;
        };
        buffer.push(b);
        if buffer.ends_with(&EOI_MARKER) {
            report.complete = true;
            return buffer;
        }
    }
}

fn find_soi(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == SOI_MARKER.as_slice())
}
