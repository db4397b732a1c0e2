// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-ID Resolver (spec.md §4.8): a stable per-process identity,
//! optionally persisted so a restarted process reuses the same id instead
//! of orphaning its in-flight claims.

use std::path::Path;

use rand::rngs::OsRng;
use rand::RngCore;

/// Resolve this process's worker id: load from `persist_path` if it exists
/// and is non-empty, otherwise generate and (if a path is given) persist a
/// fresh one.
pub fn resolve(persist_path: Option<&Path>) -> std::io::Result<String> {
    if let Some(path) = persist_path {
        if let Ok(contents) = std::fs::read_to_string(path) {
            let trimmed = contents.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }
    }

    let id = generate();
    if let Some(path) = persist_path {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &id)?;
    }
    Ok(id)
}

fn generate() -> String {
    let mut bytes = [0u8; 12];
    OsRng.fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("worker-{hex}")
}

#[cfg(test)]
#[path = "worker_id_tests.rs"]
mod tests;
