// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Selects a `Runtime` variant from environment configuration (spec.md
//! §4.3's options table).

use std::sync::Arc;

use crate::containerized::ContainerizedRuntime;
use crate::exec::Runtime;
use crate::local::LocalRuntime;
use crate::path_mapper::PathMapper;

/// `TK_RUNTIME_KIND`: `local` (default) or `containerized`.
const RUNTIME_KIND: &str = "TK_RUNTIME_KIND";
/// `TK_RUNTIME_CONTAINER_ID`: required for the containerized variant.
const CONTAINER_ID: &str = "TK_RUNTIME_CONTAINER_ID";
/// `TK_RUNTIME_HOST_PATH` / `TK_RUNTIME_CONTAINER_PATH`: Path Mapper prefixes.
const HOST_PATH: &str = "TK_RUNTIME_HOST_PATH";
const CONTAINER_PATH: &str = "TK_RUNTIME_CONTAINER_PATH";
/// `TK_RUNTIME_MAP_UID`: `true` (default) or `false`.
const MAP_UID: &str = "TK_RUNTIME_MAP_UID";

/// Build the configured `Runtime` from the process environment.
///
/// Returns an error message (rather than `KernelError`, since this is a
/// startup-time configuration problem, not a kernel operation) if
/// `containerized` is requested without a container id.
pub fn from_env() -> Result<Arc<dyn Runtime>, String> {
    let kind = std::env::var(RUNTIME_KIND).unwrap_or_else(|_| "local".to_string());
    match kind.as_str() {
        "containerized" => {
            let container_id = std::env::var(CONTAINER_ID)
                .map_err(|_| format!("{CONTAINER_ID} is required when {RUNTIME_KIND}=containerized"))?;
            let path_mapper = match (std::env::var(HOST_PATH), std::env::var(CONTAINER_PATH)) {
                (Ok(host_root), Ok(exec_root)) => PathMapper::VolumePrefix { host_root, exec_root },
                _ => PathMapper::Identity,
            };
            let map_uid = std::env::var(MAP_UID).map(|v| v != "false").unwrap_or(true);
            Ok(Arc::new(ContainerizedRuntime::new(container_id, path_mapper, map_uid)))
        }
        _ => Ok(Arc::new(LocalRuntime::new())),
    }
}

#[cfg(test)]
#[path = "factory_tests.rs"]
mod tests;
