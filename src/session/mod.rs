//! 会话驱动
//!
//! 一次会话独占链路：打开、读欢迎横幅、派发一个测试动作、
//! 持久化会话日志、重试关闭链路。

mod error;
mod log;
mod spec;

pub use error::SessionError;
pub use log::SessionLog;
pub use spec::{
    DEFAULT_DURATION_MS, DEFAULT_SPEED_BPS, DEFAULT_TIMEOUT_MS, DEFAULT_TRACE_INTERVAL,
    SessionAction, SessionSpec, SessionSummary,
};

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::link::{Link, StreamReader, TailWindow};
use crate::output::SampleWriter;
use crate::probe::{ArqTest, EchoTest, GpsTraceExtractor, ImageDownload};

/// 欢迎横幅的结束标记。
const GREETING_END: &[u8] = b"\r\n\n\n";

/// 一次测量会话：独占链路与日志块。
pub struct Session {
    link: Box<dyn Link>,
    pub log: SessionLog,
}

impl Session {
    /// 配置并打开链路，开启日志块。
    pub fn open(
        mut link: Box<dyn Link>,
        name: &str,
        speed_bps: u32,
        timeout_ms: u64,
        log_path: PathBuf,
    ) -> io::Result<Session> {
        link.set_speed(speed_bps);
        link.set_timeout(timeout_ms);
        link.open(name)?;
        Ok(Session {
            link,
            log: SessionLog::new(log_path),
        })
    }

    /// 读取并记录欢迎横幅，直到固定结束标记或流结束。
    pub fn read_greeting(&mut self) {
        let mut tail = TailWindow::new(GREETING_END.len());
        let mut banner = String::new();
        let mut reader = StreamReader::new(self.link.as_mut());
        loop {
            let Some(b) = reader.next_byte() else {
                warn!("欢迎横幅在结束标记之前中断");
                break;
            };
            tail.push(b);
            banner.push(char::from(b));
            if tail.ends_with(GREETING_END) {
                break;
            }
        }
        debug!(len = banner.len(), "欢迎横幅读取完成");
        self.log.append(&banner);
    }

    /// 写请求码并记录日志；失败返回 false。
    pub fn write_request(&mut self, code: &str) -> bool {
        if self.link.write(code.as_bytes()) {
            self.log.append(&format!("\n-Write:{}\n", code.trim_end()));
            true
        } else {
            warn!(code = %code.trim_end(), "请求码写出失败");
            false
        }
    }

    /// 执行选定的测试动作，输出文件写到 `out_dir`，返回结果摘要。
    pub fn run(
        &mut self,
        spec: &SessionSpec,
        out_dir: &Path,
    ) -> Result<SessionSummary, SessionError> {
        let duration = Duration::from_millis(spec.duration_ms.unwrap_or(DEFAULT_DURATION_MS));
        let mut summary = SessionSummary {
            action: spec.action.as_str().to_string(),
            ..SessionSummary::default()
        };

        match spec.action {
            SessionAction::Echo => {
                let mut samples = SampleWriter::create(out_dir, "echo");
                let test = EchoTest {
                    code: format!("{}\r", spec.request_code),
                    duration,
                };
                let report = test.run(self.link.as_mut(), &mut self.log, &mut samples)?;
                summary.rounds = Some(report.rounds);
            }
            SessionAction::Image | SessionAction::ImageNoisy => {
                if !self.write_request(&format!("{}\r", spec.request_code)) {
                    return Err(SessionError::WriteFailed {
                        what: "image request code",
                    });
                }
                let report = self.download_image(spec, out_dir)?;
                summary.image_bytes = Some(report.0);
                summary.image_file = report.1;
            }
            SessionAction::ImageGps => {
                let secondary = spec.secondary_code.clone().unwrap_or_default();
                if !self.write_request(&format!("{}{}\r", spec.request_code, secondary)) {
                    return Err(SessionError::WriteFailed {
                        what: "gps request code",
                    });
                }
                let extractor = GpsTraceExtractor {
                    interval: spec.trace_interval.unwrap_or(DEFAULT_TRACE_INTERVAL),
                };
                let gps = extractor.run(self.link.as_mut(), &mut self.log)?;
                summary.traces_captured = Some(gps.traces.len());
                summary.follow_up_len = Some(gps.follow_up.len());
                if !self.write_request(&format!("{}{}\r", spec.request_code, gps.follow_up)) {
                    return Err(SessionError::WriteFailed {
                        what: "gps follow-up code",
                    });
                }
                let report = self.download_image(spec, out_dir)?;
                summary.image_bytes = Some(report.0);
                summary.image_file = report.1;
            }
            SessionAction::Arq => {
                let nack = spec.secondary_code.clone().unwrap_or_default();
                let mut latency = SampleWriter::create(out_dir, "arq_latency");
                let mut repeats = SampleWriter::create(out_dir, "arq_repeats");
                let test = ArqTest {
                    ack: format!("{}\r", spec.request_code),
                    nack: format!("{nack}\r"),
                    duration,
                };
                let report = test.run(
                    self.link.as_mut(),
                    &mut self.log,
                    &mut latency,
                    &mut repeats,
                )?;
                summary.acks_sent = Some(report.acks_sent);
                summary.nacks_sent = Some(report.nacks_sent);
            }
        }
        Ok(summary)
    }

    /// 持久化日志并关闭链路（重试直到成功）。
    pub fn finish(mut self) {
        self.log.persist();
        let mut attempts: u64 = 0;
        while !self.link.close() {
            attempts += 1;
            warn!(attempts, "链路关闭失败，重试");
        }
        info!("会话结束");
    }

    fn download_image(
        &mut self,
        spec: &SessionSpec,
        out_dir: &Path,
    ) -> Result<(usize, Option<String>), SessionError> {
        let tag = spec
            .image_tag
            .clone()
            .or_else(|| spec.action.default_image_tag().map(str::to_string))
            .unwrap_or_else(|| "E1".to_string());
        let download = ImageDownload { tag };
        let report = download.run(self.link.as_mut(), &mut self.log, out_dir)?;
        Ok((
            report.bytes_captured,
            report.file.map(|p| p.display().to_string()),
        ))
    }
}
