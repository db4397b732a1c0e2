// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves the worktree and its derived socket path once per invocation,
//! reusing `tk-daemon`'s own resolution logic so the CLI and daemon always
//! agree on where to rendezvous.

use std::path::PathBuf;

use anyhow::{Context, Result};

pub struct SocketTarget {
    pub worktree: PathBuf,
    pub socket: PathBuf,
}

impl SocketTarget {
    pub fn resolve() -> Result<Self> {
        let worktree = tk_daemon::paths::resolve_worktree()
            .context("could not determine the worktree root (not inside a git checkout?)")?;
        let socket_paths = tk_daemon::socket::resolve(&worktree)
            .context("could not derive the daemon socket path")?;
        Ok(Self { worktree, socket: socket_paths.socket })
    }
}
