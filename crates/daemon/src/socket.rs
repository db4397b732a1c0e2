// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket path derivation (spec.md §6): `sha256(uid || worktree_path)`
//! truncated to 16 hex chars, placed under `$XDG_RUNTIME_DIR` (falling back
//! to `/tmp/tk-<uid>`) as `<hash>.sock`.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::env;

/// The derived (or overridden) socket path, and its sibling `.lock` file.
pub struct SocketPaths {
    pub socket: PathBuf,
    pub lock: PathBuf,
}

pub fn resolve(worktree: &Path) -> std::io::Result<SocketPaths> {
    if let Some(socket) = env::socket_path_override() {
        let lock = with_suffix(&socket, ".lock");
        return Ok(SocketPaths { socket, lock });
    }

    let uid = nix::unistd::getuid();
    let hash = hash_identity(uid.as_raw(), worktree);
    let dir = runtime_dir(uid.as_raw())?;
    std::fs::create_dir_all(&dir)?;
    let socket = dir.join(format!("{hash}.sock"));
    let lock = dir.join(format!("{hash}.sock.lock"));
    Ok(SocketPaths { socket, lock })
}

fn hash_identity(uid: u32, worktree: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(uid.to_le_bytes());
    hasher.update(worktree.as_os_str().as_encoded_bytes());
    let digest = hasher.finalize();
    let full_hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
    full_hex[..16].to_string()
}

fn runtime_dir(uid: u32) -> std::io::Result<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(dir));
    }
    Ok(PathBuf::from(format!("/tmp/tk-{uid}")))
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

#[cfg(test)]
#[path = "socket_tests.rs"]
mod tests;
