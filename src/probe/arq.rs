//! ARQ（停等重传）测试
//!
//! 发 ACK 请求码取下一条报文；校验和不符时改发 NACK 请求重传。
//! 只有被接受的回合才记录往返时延与重传次数，也只有在被接受的
//! 回合上才检查测试时长：NACK 风暴可以把测试拖过期限，这是
//! 协议本身的约定，不另加看门狗。

use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::link::{Link, StreamReader};
use crate::output::{self, SampleWriter};
use crate::session::{SessionError, SessionLog};

use super::RESPONSE_STOP;
use super::fields::{ARQ_FCS, ARQ_PAYLOAD};

/// ARQ 测试参数。
#[derive(Debug, Clone)]
pub struct ArqTest {
    /// ACK 请求码（请求下一条报文）。
    pub ack: String,
    /// NACK 请求码（请求重传当前报文）。
    pub nack: String,
    /// 总测试时长。
    pub duration: Duration,
}

/// ARQ 测试累计计数。
#[derive(Debug, Default)]
pub struct ArqReport {
    pub acks_sent: u64,
    pub nacks_sent: u64,
}

/// 下一轮要发的请求码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outgoing {
    Ack,
    Nack,
}

/// 载荷字节的累积异或校验和。
pub fn xor_checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0, |acc, b| acc ^ b)
}

impl ArqTest {
    pub fn run(
        &self,
        link: &mut dyn Link,
        log: &mut SessionLog,
        latency: &mut SampleWriter,
        repeats_out: &mut SampleWriter,
    ) -> Result<ArqReport, SessionError> {
        log.append(&format!(
            "\nStarting ARQ test ({})\n -ACK:{}\n -NACK:{}\n",
            output::timestamp(),
            self.ack.trim_end(),
            self.nack.trim_end()
        ));
        info!(
            duration_ms = self.duration.as_millis() as u64,
            "▶️  开始 ARQ 测试"
        );

        let started = Instant::now();
        let mut report = ArqReport::default();
        let mut repeats: u64 = 0;
        let mut outgoing = Outgoing::Ack;
        // 往返计时从最近一次 ACK 发出算起；NACK 重传不重置计时。
        let mut send_at = Instant::now();

        let outcome = loop {
            let code = match outgoing {
                Outgoing::Ack => &self.ack,
                Outgoing::Nack => &self.nack,
            };
            if !link.write(code.as_bytes()) {
                break Err(SessionError::WriteFailed {
                    what: "arq request code",
                });
            }
            match outgoing {
                Outgoing::Ack => {
                    send_at = Instant::now();
                    report.acks_sent += 1;
                }
                Outgoing::Nack => {
                    report.nacks_sent += 1;
                    repeats += 1;
                }
            }

            let Some(response) = StreamReader::new(link).read_packet(RESPONSE_STOP) else {
                break Err(SessionError::StreamEnded {
                    expected: "arq stop marker",
                });
            };

            let payload = match ARQ_PAYLOAD.extract(&response) {
                Ok(p) => p,
                Err(e) => break Err(e),
            };
            let received = match ARQ_FCS.extract_u32(&response) {
                Ok(v) => v,
                Err(e) => break Err(e),
            };
            let computed = xor_checksum(payload.as_bytes());

            if u32::from(computed) == received {
                let delay_ms = send_at.elapsed().as_millis() as u64;
                latency.record(delay_ms);
                repeats_out.record(repeats);
                debug!(delay_ms, repeats, "报文通过校验");
                repeats = 0;
                outgoing = Outgoing::Ack;
                if started.elapsed() >= self.duration {
                    break Ok(());
                }
            } else {
                trace!(
                    computed = u32::from(computed),
                    received, "校验和不符，请求重传"
                );
                outgoing = Outgoing::Nack;
            }
        };

        match outcome {
            Ok(()) => {
                log.append(&format!(
                    "\nFinished ARQ test ({})\nACK code sent {} times\nNACK code sent {} times\n",
                    output::timestamp(),
                    report.acks_sent,
                    report.nacks_sent
                ));
                info!(
                    acks = report.acks_sent,
                    nacks = report.nacks_sent,
                    "✅ ARQ 测试完成"
                );
                Ok(report)
            }
            Err(e) => {
                log.append(&format!(
                    "\nAborted ARQ test ({}): {e}\n",
                    output::timestamp()
                ));
                Err(e)
            }
        }
    }
}
