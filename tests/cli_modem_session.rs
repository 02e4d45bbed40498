use serde_json::Value;
use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "vmodem-rs-cli-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

/// Read one CR-terminated request code; None on end of stream.
fn read_request(stream: &mut TcpStream) -> Option<Vec<u8>> {
    let mut line = Vec::new();
    let mut buf = [0u8; 1];
    loop {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(_) => {
                line.push(buf[0]);
                if buf[0] == b'\r' {
                    return Some(line);
                }
            }
        }
    }
}

/// Fake lab server: greet, then answer every request with `respond`.
fn spawn_server(
    respond: impl Fn(&mut TcpStream, u64) + Send + 'static,
) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake server");
    let addr = listener.local_addr().expect("local addr").to_string();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        stream
            .write_all(b"VIRTUAL LAB SERVER READY\r\n\n\n")
            .expect("greeting");
        let mut round: u64 = 0;
        while read_request(&mut stream).is_some() {
            respond(&mut stream, round);
            round += 1;
        }
    });
    (addr, handle)
}

fn run_session(dir: &Path, session: &Path, addr: &str) -> (std::process::Output, PathBuf, PathBuf) {
    let out_dir = dir.join("data");
    let log_file = dir.join("log.txt");
    let summary = dir.join("summary.json");
    let output = Command::new(env!("CARGO_BIN_EXE_modem_session"))
        .args([
            "--session",
            session.to_str().unwrap(),
            "--addr",
            addr,
            "--out-dir",
            out_dir.to_str().unwrap(),
            "--log-file",
            log_file.to_str().unwrap(),
            "--summary-json",
            summary.to_str().unwrap(),
        ])
        .output()
        .expect("run modem_session");
    (output, out_dir, summary)
}

fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix))
        })
        .collect()
}

#[test]
fn echo_session_produces_samples_log_and_summary() {
    let (addr, server) = spawn_server(|stream, _| {
        stream.write_all(b"ECHO PACKET PSTOP").expect("echo response");
    });

    let dir = unique_temp_dir("echo");
    let session = write_file(
        &dir,
        "session.json",
        r#"
{
    "action": "echo",
    "request_code": "E0000",
    "duration_ms": 1,
    "speed_bps": 80000,
    "timeout_ms": 2000
}
        "#,
    );

    let (output, out_dir, summary) = run_session(&dir, &session, &addr);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("session_result action=echo"));

    let csvs = files_with_prefix(&out_dir, "echo_");
    assert_eq!(csvs.len(), 1, "one echo CSV per session");
    let samples = fs::read_to_string(&csvs[0]).expect("read echo csv");
    let values: Vec<u64> = samples
        .lines()
        .map(|l| l.parse().expect("integer sample"))
        .collect();
    assert!(!values.is_empty());

    let log = fs::read_to_string(dir.join("log.txt")).expect("read session log");
    assert!(log.starts_with("-------------------------["));
    assert!(log.contains("VIRTUAL LAB SERVER READY"));
    assert!(log.contains("Starting echo test"));
    assert!(log.contains("-------------------------END-------------------------"));

    let summary: Value =
        serde_json::from_str(&fs::read_to_string(&summary).expect("summary file"))
            .expect("summary json");
    assert_eq!(summary["action"], "echo");
    assert!(summary["rounds"].as_u64().expect("rounds") >= 1);

    server.join().expect("server thread");
}

#[test]
fn image_session_reconstructs_the_payload_from_soi() {
    let (addr, server) = spawn_server(|stream, _| {
        // framing noise, then SOI .. EOI
        stream
            .write_all(&[0x00, 0x11, 0xFF, 0xD8, 0x22, 0x33, 0xFF, 0xD9])
            .expect("image bytes");
    });

    let dir = unique_temp_dir("image");
    let session = write_file(
        &dir,
        "session.json",
        r#"
{
    "action": "image",
    "request_code": "M0000",
    "timeout_ms": 2000
}
        "#,
    );

    let (output, out_dir, summary) = run_session(&dir, &session, &addr);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let images = files_with_prefix(&out_dir, "E1_");
    assert_eq!(images.len(), 1, "one reconstructed image");
    let bytes = fs::read(&images[0]).expect("read image");
    assert_eq!(bytes, vec![0xFF, 0xD8, 0x22, 0x33, 0xFF, 0xD9]);

    let summary: Value =
        serde_json::from_str(&fs::read_to_string(&summary).expect("summary file"))
            .expect("summary json");
    assert_eq!(summary["action"], "image");
    assert_eq!(summary["image_bytes"].as_u64(), Some(8));

    server.join().expect("server thread");
}

#[test]
fn arq_session_accepts_valid_checksums_without_retransmission() {
    let (addr, server) = spawn_server(|stream, _| {
        let payload = b"0123456789ABCDEF";
        let fcs = payload.iter().fold(0u8, |acc, b| acc ^ b);
        let response = format!(
            "{:<31}{}--{fcs:03}PSTOP",
            "ARQ PACKET",
            String::from_utf8_lossy(payload)
        );
        stream
            .write_all(response.as_bytes())
            .expect("arq response");
    });

    let dir = unique_temp_dir("arq");
    let session = write_file(
        &dir,
        "session.json",
        r#"
{
    "action": "arq",
    "request_code": "Q0000",
    "secondary_code": "R0000",
    "duration_ms": 1,
    "timeout_ms": 2000
}
        "#,
    );

    let (output, out_dir, summary) = run_session(&dir, &session, &addr);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let latency = files_with_prefix(&out_dir, "arq_latency_");
    let repeats = files_with_prefix(&out_dir, "arq_repeats_");
    assert_eq!(latency.len(), 1);
    assert_eq!(repeats.len(), 1);

    let repeat_values = fs::read_to_string(&repeats[0]).expect("read repeats csv");
    assert!(repeat_values.lines().count() >= 1);
    for line in repeat_values.lines() {
        assert_eq!(line, "0", "valid checksums mean zero retransmissions");
    }

    let summary: Value =
        serde_json::from_str(&fs::read_to_string(&summary).expect("summary file"))
            .expect("summary json");
    assert_eq!(summary["action"], "arq");
    assert!(summary["acks_sent"].as_u64().expect("acks") >= 1);
    assert_eq!(summary["nacks_sent"].as_u64(), Some(0));

    server.join().expect("server thread");
}
