// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tk-daemon: the long-lived per-worktree RPC server (`tkd`). Wires the
//! State Engine, Trajectory Logger, and Runtime behind the Unix-socket
//! dispatch table (spec.md §4.7).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod handlers;
pub mod lock;
pub mod paths;
pub mod server;
pub mod socket;

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Lock(#[from] lock::LockError),
    #[error("runtime configuration error: {0}")]
    Runtime(String),
}
