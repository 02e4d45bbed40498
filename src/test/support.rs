use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::link::Link;
use crate::session::SessionLog;

/// Scripted link double: serves canned incoming bytes and records writes.
pub struct ScriptedLink {
    incoming: VecDeque<u8>,
    pub written: Vec<Vec<u8>>,
    pub fail_writes: bool,
    pub fail_reads: bool,
}

impl ScriptedLink {
    pub fn new(incoming: &[u8]) -> ScriptedLink {
        ScriptedLink {
            incoming: incoming.iter().copied().collect(),
            written: Vec::new(),
            fail_writes: false,
            fail_reads: false,
        }
    }

    pub fn written_strings(&self) -> Vec<String> {
        self.written
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }
}

impl Link for ScriptedLink {
    fn open(&mut self, _session_name: &str) -> io::Result<()> {
        Ok(())
    }

    fn close(&mut self) -> bool {
        true
    }

    fn set_speed(&mut self, _bps: u32) {}

    fn set_timeout(&mut self, _ms: u64) {}

    fn write(&mut self, bytes: &[u8]) -> bool {
        if self.fail_writes {
            return false;
        }
        self.written.push(bytes.to_vec());
        true
    }

    fn read(&mut self) -> io::Result<Option<u8>> {
        if self.fail_reads {
            return Err(io::Error::other("scripted read failure"));
        }
        Ok(self.incoming.pop_front())
    }
}

pub fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "vmodem-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

/// Fresh session log backed by a unique temp file.
pub fn temp_log(prefix: &str) -> (PathBuf, SessionLog) {
    let path = unique_temp_dir(prefix).join("log.txt");
    let log = SessionLog::new(path.clone());
    (path, log)
}

pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
