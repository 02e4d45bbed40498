use std::fs;

use crate::session::SessionLog;

use super::support::{temp_log, unique_temp_dir};

#[test]
fn snapshot_holds_the_banner_and_appended_text() {
    let (_, mut log) = temp_log("log-snapshot");
    log.append("hello");
    log.append(" world");
    assert!(log.snapshot().starts_with("-------------------------["));
    assert!(log.snapshot().ends_with("hello world"));
}

#[test]
fn persist_writes_one_banner_bounded_block_and_clears_the_buffer() {
    let (path, mut log) = temp_log("log-persist");
    log.append("entry one\n");
    log.persist();

    assert!(log.snapshot().is_empty());
    let content = fs::read_to_string(&path).expect("read log file");
    assert!(content.starts_with("-------------------------["));
    assert!(content.contains("entry one\n"));
    assert!(content.contains("-------------------------END-------------------------"));
}

#[test]
fn oversized_buffers_spill_to_the_file_before_persist() {
    let (path, mut log) = temp_log("log-spill");
    let chunk = "x".repeat(16 * 1024);
    for _ in 0..5 {
        log.append(&chunk);
    }

    assert!(
        log.snapshot().len() < 64 * 1024,
        "buffer must stay bounded after the spill"
    );
    let on_disk = fs::read_to_string(&path).expect("spilled file");
    assert!(on_disk.len() >= 64 * 1024);

    log.persist();
    let content = fs::read_to_string(&path).expect("read log file");
    assert!(content.contains("-------------------------END-------------------------"));
}

#[test]
fn persist_failure_keeps_the_content_and_does_not_panic() {
    let dir = unique_temp_dir("log-unwritable");
    let path = dir.join("missing").join("log.txt");
    let mut log = SessionLog::new(path.clone());
    log.append("do not lose this");
    log.persist();

    assert!(!path.exists());
    assert!(log.snapshot().contains("do not lose this"));
}
