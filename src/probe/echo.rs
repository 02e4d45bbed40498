//! 回显时延测试
//!
//! 反复发送请求码并等待以停止标记结尾的回显包，
//! 每轮记录一条往返时延（毫秒），直到测试时长用完。
//! 时长只在回合边界检查；流在标记之前结束会中止整个测试，
//! 不会记录半个样本。

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::link::{Link, StreamReader};
use crate::output::{self, SampleWriter};
use crate::session::{SessionError, SessionLog};

use super::RESPONSE_STOP;

/// 回显测试参数。
#[derive(Debug, Clone)]
pub struct EchoTest {
    /// 请求码（按原样写出）。
    pub code: String,
    /// 总测试时长。
    pub duration: Duration,
}

/// 回显测试结果。
#[derive(Debug, Default)]
pub struct EchoReport {
    pub rounds: u64,
}

/// 回合状态机：发送 → 等待回显 → 判定是否继续。
#[derive(Debug)]
enum EchoState {
    Send,
    Await { sent_at: Instant },
    Evaluate,
    Done,
}

impl EchoTest {
    pub fn run(
        &self,
        link: &mut dyn Link,
        log: &mut SessionLog,
        samples: &mut SampleWriter,
    ) -> Result<EchoReport, SessionError> {
        log.append(&format!(
            "\nStarting echo test ({})\n -Code:{}\n",
            output::timestamp(),
            self.code.trim_end()
        ));
        info!(
            code = %self.code.trim_end(),
            duration_ms = self.duration.as_millis() as u64,
            "▶️  开始回显测试"
        );

        let started = Instant::now();
        let mut report = EchoReport::default();
        let mut state = EchoState::Send;

        let outcome = loop {
            state = match state {
                EchoState::Send => {
                    if !link.write(self.code.as_bytes()) {
                        break Err(SessionError::WriteFailed {
                            what: "echo request code",
                        });
                    }
                    EchoState::Await {
                        sent_at: Instant::now(),
                    }
                }
                EchoState::Await { sent_at } => {
                    let Some(packet) = StreamReader::new(link).read_packet(RESPONSE_STOP) else {
                        break Err(SessionError::StreamEnded {
                            expected: "echo stop marker",
                        });
                    };
                    let delay_ms = sent_at.elapsed().as_millis() as u64;
                    samples.record(delay_ms);
                    report.rounds += 1;
                    debug!(round = report.rounds, delay_ms, packet = %packet.trim_end(), "回显往返完成");
                    EchoState::Evaluate
                }
                EchoState::Evaluate => {
                    if started.elapsed() >= self.duration {
                        EchoState::Done
                    } else {
                        EchoState::Send
                    }
                }
                EchoState::Done => break Ok(()),
            };
        };

        match outcome {
            Ok(()) => {
                log.append(&format!("\nFinished echo test ({})\n", output::timestamp()));
                info!(rounds = report.rounds, "✅ 回显测试完成");
                Ok(report)
            }
            Err(e) => {
                log.append(&format!(
                    "\nAborted echo test ({}): {e}\n",
                    output::timestamp()
                ));
                Err(e)
            }
        }
    }
}
