// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic-replace JSON persistence: temp file + fsync + rename, never an
//! in-place write. Readers of the canonical path always see either the full
//! old file or the full new one (spec.md §3, "Atomic replace" glossary entry).

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tk_core::{KernelError, Result};

/// Serialize `value` and replace `path` atomically.
///
/// The temp file is a sibling of `path` (same directory, `.tmp` suffix) so
/// the final `rename` is same-filesystem and therefore atomic.
pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_path = path.as_os_str().to_os_string();
    tmp_path.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_path);

    let json = serde_json::to_string_pretty(value)?;
    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        KernelError::from(e)
    })?;
    Ok(())
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
