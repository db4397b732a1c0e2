// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::Deserialize;
use tempfile::tempdir;

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct Sample {
    a: u32,
    b: String,
}

#[test]
fn writes_and_reads_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    let value = Sample { a: 1, b: "x".into() };
    atomic_write_json(&path, &value).unwrap();
    let read_back: Sample = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(read_back, value);
}

#[test]
fn leaves_no_temp_file_behind() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    atomic_write_json(&path, &Sample { a: 1, b: "x".into() }).unwrap();
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    assert!(!std::path::Path::new(&tmp).exists());
}

#[test]
fn second_write_replaces_first_atomically() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    atomic_write_json(&path, &Sample { a: 1, b: "x".into() }).unwrap();
    atomic_write_json(&path, &Sample { a: 2, b: "y".into() }).unwrap();
    let read_back: Sample = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(read_back, Sample { a: 2, b: "y".into() });
}

#[test]
fn creates_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/deep/state.json");
    atomic_write_json(&path, &Sample { a: 1, b: "x".into() }).unwrap();
    assert!(path.exists());
}
