//! TCP 链路
//!
//! 把远端实验服务器的虚拟 modem 映射成一条阻塞 TCP 连接。
//! 速率只作记录（真实节流由远端完成），超时映射为套接字读超时。

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::Link;

/// 阻塞式 TCP 链路。
#[derive(Debug)]
pub struct TcpLink {
    addr: String,
    stream: Option<TcpStream>,
    speed_bps: u32,
    timeout: Duration,
}

impl TcpLink {
    pub fn new(addr: impl Into<String>) -> TcpLink {
        TcpLink {
            addr: addr.into(),
            stream: None,
            speed_bps: 0,
            timeout: Duration::from_millis(2_000),
        }
    }
}

impl Link for TcpLink {
    fn open(&mut self, session_name: &str) -> io::Result<()> {
        let stream = TcpStream::connect(&self.addr)?;
        stream.set_read_timeout(Some(self.timeout))?;
        info!(
            addr = %self.addr,
            session = session_name,
            speed_bps = self.speed_bps,
            "链路已打开"
        );
        self.stream = Some(stream);
        Ok(())
    }

    fn close(&mut self) -> bool {
        let Some(stream) = self.stream.take() else {
            return true;
        };
        match stream.shutdown(Shutdown::Both) {
            Ok(()) => true,
            // 对端已经断开也算关闭成功
            Err(e) if e.kind() == io::ErrorKind::NotConnected => true,
            Err(e) => {
                warn!(error = %e, "链路关闭失败");
                self.stream = Some(stream);
                false
            }
        }
    }

    fn set_speed(&mut self, bps: u32) {
        self.speed_bps = bps;
        debug!(bps, "记录链路速率");
    }

    fn set_timeout(&mut self, ms: u64) {
        self.timeout = Duration::from_millis(ms.max(1));
        if let Some(stream) = &self.stream {
            if let Err(e) = stream.set_read_timeout(Some(self.timeout)) {
                warn!(error = %e, "设置读超时失败");
            }
        }
    }

    fn write(&mut self, bytes: &[u8]) -> bool {
        let Some(stream) = &mut self.stream else {
            return false;
        };
        match stream.write_all(bytes).and_then(|_| stream.flush()) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "链路写失败");
                false
            }
        }
    }

    fn read(&mut self) -> io::Result<Option<u8>> {
        let Some(stream) = &mut self.stream else {
            return Ok(None);
        };
        let mut buf = [0u8; 1];
        loop {
            match stream.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    debug!("读超时，按流结束处理");
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
