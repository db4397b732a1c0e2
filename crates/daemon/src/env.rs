// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.
//!
//! Runtime selection (`TK_RUNTIME_*`) is owned by `tk_runtime::factory` and
//! not duplicated here — this module covers only daemon-specific concerns.

use std::path::PathBuf;
use std::time::Duration;

/// Override the default hash-derived socket path (spec.md §6).
pub fn socket_path_override() -> Option<PathBuf> {
    std::env::var_os("TK_SOCKET_PATH").map(PathBuf::from)
}

/// Pin the worktree root instead of deriving it from a VCS root query.
pub fn worktree_override() -> Option<PathBuf> {
    std::env::var_os("TK_WORKTREE").map(PathBuf::from)
}

/// Path for persisting the resolved worker id across daemon restarts
/// (spec.md §4.8/§6, "worker-id file (optional)").
pub fn worker_id_file() -> Option<PathBuf> {
    std::env::var_os("TK_WORKER_ID_FILE").map(PathBuf::from)
}

/// Bound on waiting for in-flight handlers during ordered shutdown
/// (spec.md §4.7's "short bound").
pub fn shutdown_drain_timeout() -> Duration {
    std::env::var("TK_SHUTDOWN_DRAIN_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}
