// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance-exclusivity lock (spec.md §4.7): an advisory `flock` on a file
//! sibling to the socket path. A second daemon targeting the same worktree
//! fails fast instead of silently binding over the first.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use fs2::FileExt;

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("another daemon instance already holds the lock at {0}")]
    AlreadyLocked(PathBuf),
    #[error("io error acquiring lock at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// Holds the lock file open for the process lifetime; the advisory lock is
/// released when this is dropped (the fd closes).
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Acquire the lock, then write the current PID into it. The PID is
    /// only written after a successful acquisition, so a failed attempt
    /// never clobbers a running daemon's PID file.
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| LockError::Io { path: path.to_path_buf(), source })?;

        file.try_lock_exclusive().map_err(|_| LockError::AlreadyLocked(path.to_path_buf()))?;

        use std::io::{Seek, SeekFrom, Write};
        let mut file = file;
        file.set_len(0).map_err(|source| LockError::Io { path: path.to_path_buf(), source })?;
        file.seek(SeekFrom::Start(0)).map_err(|source| LockError::Io { path: path.to_path_buf(), source })?;
        write!(file, "{}", std::process::id())
            .map_err(|source| LockError::Io { path: path.to_path_buf(), source })?;
        file.sync_all().map_err(|source| LockError::Io { path: path.to_path_buf(), source })?;

        Ok(Self { file, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
