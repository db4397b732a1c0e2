// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::{json, Map};
use tempfile::tempdir;
use tk_core::trajectory::event;

#[test]
fn tail_on_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let logger = TrajectoryLogger::new(dir.path().join("trajectory.jsonl"));
    assert_eq!(logger.tail(5).unwrap(), Vec::<Value>::new());
}

#[test]
fn tail_on_empty_file_is_empty() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trajectory.jsonl");
    fs::write(&path, b"").unwrap();
    let logger = TrajectoryLogger::new(path);
    assert_eq!(logger.tail(5).unwrap(), Vec::<Value>::new());
}

#[test]
fn log_then_tail_returns_event_at_expected_position() {
    let dir = tempdir().unwrap();
    let logger = TrajectoryLogger::new(dir.path().join("trajectory.jsonl"));
    logger.log(&event("claim", Some("1"), Some("w1"), 1, Map::new())).unwrap();
    logger.log(&event("complete", Some("1"), Some("w1"), 2, Map::new())).unwrap();
    logger.log(&event("claim", Some("2"), Some("w1"), 3, Map::new())).unwrap();

    let tail = logger.tail(2).unwrap();
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0]["event"], "complete");
    assert_eq!(tail[1]["event"], "claim");
    assert_eq!(tail[1]["task_id"], "2");
}

#[test]
fn tail_requesting_more_than_exist_returns_all_of_them() {
    let dir = tempdir().unwrap();
    let logger = TrajectoryLogger::new(dir.path().join("trajectory.jsonl"));
    logger.log(&event("claim", Some("1"), Some("w1"), 1, Map::new())).unwrap();
    let tail = logger.tail(50).unwrap();
    assert_eq!(tail.len(), 1);
}

/// One valid line plus an appended corrupt fragment (simulating a crash
/// mid-write) must yield exactly the one valid event.
#[test]
fn tail_skips_a_trailing_corrupt_fragment() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trajectory.jsonl");
    let mut contents = serde_json::to_string(&event("claim", Some("1"), Some("w1"), 1, Map::new())).unwrap();
    contents.push('\n');
    contents.push_str("{\"event\":\"complete\",\"task_i"); // truncated mid-object, no trailing newline
    fs::write(&path, contents).unwrap();

    let logger = TrajectoryLogger::new(path);
    let tail = logger.tail(5).unwrap();
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0]["event"], "claim");
}

// Scenario 7: 10,000 entries, tail(5) returns the last 5 in order.
#[test]
fn tail_on_a_large_journal_returns_the_last_n_in_order() {
    let dir = tempdir().unwrap();
    let logger = TrajectoryLogger::new(dir.path().join("trajectory.jsonl"));
    for i in 0..10_000u64 {
        logger.log(&event("claim", Some(&i.to_string()), Some("w1"), i, Map::new())).unwrap();
    }
    let tail = logger.tail(5).unwrap();
    assert_eq!(tail.len(), 5);
    let ids: Vec<&str> = tail.iter().map(|e| e["task_id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["9995", "9996", "9997", "9998", "9999"]);
}

#[test]
fn memory_cap_bounds_how_much_is_read_even_if_fewer_than_n_are_found() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("trajectory.jsonl");
    // One giant single line, far bigger than a tiny cap.
    let huge = json!({"event": "claim", "payload": "x".repeat(10_000)});
    let mut contents = serde_json::to_string(&huge).unwrap();
    contents.push('\n');
    fs::write(&path, contents).unwrap();

    let logger = TrajectoryLogger::with_memory_cap(path, 512);
    // Should not hang or error even though the single line exceeds the cap;
    // best-effort result, possibly empty.
    let tail = logger.tail(5).unwrap();
    assert!(tail.len() <= 1);
}

#[test]
fn reset_truncates_the_journal() {
    let dir = tempdir().unwrap();
    let logger = TrajectoryLogger::new(dir.path().join("trajectory.jsonl"));
    logger.log(&event("claim", Some("1"), Some("w1"), 1, Map::new())).unwrap();
    logger.reset().unwrap();
    assert_eq!(logger.tail(10).unwrap(), Vec::<Value>::new());
}

#[test]
fn log_creates_missing_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/deep/trajectory.jsonl");
    let logger = TrajectoryLogger::new(path);
    logger.log(&event("claim", Some("1"), Some("w1"), 1, Map::new())).unwrap();
    assert_eq!(logger.tail(1).unwrap().len(), 1);
}
