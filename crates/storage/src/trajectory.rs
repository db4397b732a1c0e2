// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Trajectory Logger: an append-only JSONL event journal with O(k)
//! tail reads via reverse-seek (spec.md §4.4).
//!
//! The access lock guards only directory creation and the tail read path —
//! never the append itself, which relies on `O_APPEND`'s kernel-level
//! atomicity. Holding it across append would violate the lock hierarchy in
//! spec.md §5 (trajectory lock must never be held while appending, and must
//! never be acquired while the state lock is held).

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;
use tk_core::{KernelError, Result};

const BLOCK_SIZE: u64 = 4096;
const DEFAULT_MEMORY_CAP: usize = 1024 * 1024;

pub struct TrajectoryLogger {
    path: PathBuf,
    access_lock: Mutex<()>,
    memory_cap: usize,
}

impl TrajectoryLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), access_lock: Mutex::new(()), memory_cap: DEFAULT_MEMORY_CAP }
    }

    pub fn with_memory_cap(path: impl Into<PathBuf>, memory_cap: usize) -> Self {
        Self { path: path.into(), access_lock: Mutex::new(()), memory_cap }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_dir(&self) -> Result<()> {
        let _guard = self.access_lock.lock();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append one event as a single JSON line. Crash-durable: the write is
    /// flushed and fsynced before returning.
    pub fn log(&self, event: &Value) -> Result<()> {
        self.ensure_dir()?;
        let mut line = serde_json::to_string(event)?;
        line.push('\n');
        let mut file = fs::OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    /// Last `n` events in chronological order. Missing file → empty list.
    /// Corrupt/truncated lines are skipped rather than erroring.
    pub fn tail(&self, n: usize) -> Result<Vec<Value>> {
        let _guard = self.access_lock.lock();
        tail_from_path(&self.path, n, self.memory_cap)
    }

    /// Truncate the journal. Not reachable from the RPC surface (spec.md
    /// §4.4 limits truncation to "explicit workflow reset"); kept as an
    /// internal helper for tests and any future reset command.
    pub fn reset(&self) -> Result<()> {
        let _guard = self.access_lock.lock();
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::File::create(&self.path)?;
        Ok(())
    }
}

fn tail_from_path(path: &Path, n: usize, memory_cap: usize) -> Result<Vec<Value>> {
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(KernelError::from(e)),
    };
    let file_len = file.metadata()?.len();
    if file_len == 0 {
        return Ok(Vec::new());
    }

    // Read backward in fixed-size blocks, counting newlines as we go, until
    // we've seen more than `n` of them (enough to guarantee `n` complete
    // lines) or we run out of file or memory budget. Blocks are collected
    // raw; concatenation and parsing both happen in separate passes after
    // this loop, never inside it.
    let mut pos = file_len;
    let mut newline_count = 0usize;
    let mut bytes_read = 0usize;
    let mut blocks: Vec<Vec<u8>> = Vec::new();

    while pos > 0 && newline_count <= n && bytes_read < memory_cap {
        let read_size = std::cmp::min(BLOCK_SIZE, pos);
        pos -= read_size;
        let mut buf = vec![0u8; read_size as usize];
        file.seek(SeekFrom::Start(pos))?;
        file.read_exact(&mut buf)?;
        newline_count += buf.iter().filter(|&&b| b == b'\n').count();
        bytes_read += buf.len();
        blocks.push(buf);
        if newline_count > n {
            break;
        }
    }

    blocks.reverse();
    let mut data = Vec::with_capacity(bytes_read);
    for block in blocks {
        data.extend_from_slice(&block);
    }

    let text = String::from_utf8_lossy(&data);
    let lines: Vec<&str> = text.split('\n').filter(|l| !l.is_empty()).collect();
    let start = lines.len().saturating_sub(n);

    let mut events = Vec::with_capacity(lines.len() - start);
    for line in &lines[start..] {
        if let Ok(value) = serde_json::from_str::<Value>(line) {
            events.push(value);
        }
    }
    Ok(events)
}

#[cfg(test)]
#[path = "trajectory_tests.rs"]
mod tests;
