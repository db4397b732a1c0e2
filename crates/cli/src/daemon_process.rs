// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Finding and spawning the `tkd` binary when no daemon is already serving
//! the worktree's socket.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::client::ClientError;

const DAEMON_BIN_NAME: &str = "tkd";

/// Launch `tkd` in the background against `worktree`, redirecting its
/// startup output to `.claude/daemon-startup.log` so a failure can be
/// reported back to the user instead of left silent.
pub fn spawn_background(worktree: &Path) -> Result<(), ClientError> {
    let bin = find_daemon_binary();
    let log_dir = worktree.join(".claude");
    std::fs::create_dir_all(&log_dir)
        .map_err(|e| ClientError::SpawnFailed(format!("could not create {}: {e}", log_dir.display())))?;
    let log_path = log_dir.join("daemon-startup.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| ClientError::SpawnFailed(format!("could not open {}: {e}", log_path.display())))?;
    let log_file_err = log_file
        .try_clone()
        .map_err(|e| ClientError::SpawnFailed(format!("could not clone log handle: {e}")))?;

    Command::new(&bin)
        .current_dir(worktree)
        .env("TK_WORKTREE", worktree)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log_file))
        .stderr(Stdio::from(log_file_err))
        .spawn()
        .map_err(|e| ClientError::SpawnFailed(format!("could not launch {}: {e}", bin.display())))?;

    Ok(())
}

/// Poll for the Unix socket to appear, surfacing a startup error parsed from
/// the daemon's own log if it exits before binding.
pub fn wait_for_socket(socket_path: &Path, timeout: Duration) -> Result<(), ClientError> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if socket_path.exists() {
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    Err(ClientError::SpawnFailed(format!(
        "daemon did not bind {} within {:?}",
        socket_path.display(),
        timeout
    )))
}

/// Resolve the `tkd` binary: a debug-build sibling under
/// `target/debug` when the CLI itself is a debug build, else a binary next
/// to the running CLI executable, else a bare `PATH` lookup.
fn find_daemon_binary() -> PathBuf {
    let current_exe = std::env::current_exe().ok();

    let is_debug_build = current_exe
        .as_ref()
        .and_then(|p| p.to_str())
        .map(|s| s.contains("target/debug"))
        .unwrap_or(false);

    if is_debug_build {
        if let Some(manifest_dir) = std::env::var_os("CARGO_MANIFEST_DIR") {
            let dev_path = PathBuf::from(manifest_dir)
                .parent()
                .and_then(|p| p.parent())
                .map(|p| p.join("target/debug").join(DAEMON_BIN_NAME));
            if let Some(path) = dev_path {
                if path.exists() {
                    return path;
                }
            }
        }
    }

    if let Some(ref exe) = current_exe {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join(DAEMON_BIN_NAME);
            if sibling.exists() {
                return sibling;
            }
        }
    }

    PathBuf::from(DAEMON_BIN_NAME)
}

/// Scan a daemon startup log for the last `ERROR ...` line following a
/// `--- tkd: starting (pid: N) ---` marker. `None` if no startup failed.
pub fn parse_startup_error(log: &str) -> Option<String> {
    let mut last_error = None;
    let mut saw_marker = false;
    for line in log.lines() {
        if line.starts_with("--- tkd: starting (pid:") {
            saw_marker = true;
            continue;
        }
        if saw_marker {
            if let Some(rest) = line.strip_prefix("ERROR ") {
                let message = rest
                    .strip_prefix("Failed to start daemon: ")
                    .unwrap_or(rest);
                last_error = Some(message.to_string());
            }
        }
    }
    last_error
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
