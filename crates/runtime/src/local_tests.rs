// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;
use crate::exec::ExclusiveLock;

#[test]
fn local_runtime_uses_identity_path_mapping() {
    let rt = LocalRuntime::new();
    assert_eq!(rt.path_mapper().to_execution("/anywhere"), "/anywhere");
}

#[test]
fn local_runtime_runs_a_command_end_to_end() {
    let rt = LocalRuntime::new();
    let lock = ExclusiveLock::new();
    let result = rt
        .execute(
            &["echo".to_string(), "hello".to_string()],
            "/tmp",
            Duration::from_secs(5),
            None,
            false,
            &lock,
        )
        .unwrap();
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.stdout.trim(), "hello");
}
