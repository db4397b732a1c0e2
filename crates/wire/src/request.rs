// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The RPC request types (spec.md §4.7's dispatch table) and the
//! line-oriented parser that turns one JSON line into one of them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProtocolError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    Ping,
    GetState,
    UpdateState {
        updates: serde_json::Map<String, Value>,
    },
    PlanImport {
        content: String,
    },
    TaskClaim {
        worker_id: String,
    },
    TaskComplete {
        task_id: String,
        worker_id: String,
    },
    TaskFail {
        task_id: String,
        worker_id: String,
        #[serde(default)]
        reason: Option<String>,
    },
    ListTasks,
    Exec {
        args: Vec<String>,
        cwd: String,
        #[serde(default)]
        env: Option<HashMap<String, String>>,
        #[serde(default)]
        timeout: Option<u64>,
    },
    Git {
        args: Vec<String>,
        cwd: String,
    },
    Shutdown,
}

const KNOWN_COMMANDS: &[&str] = &[
    "ping",
    "get_state",
    "update_state",
    "plan_import",
    "task_claim",
    "task_complete",
    "task_fail",
    "list_tasks",
    "exec",
    "git",
    "shutdown",
];

/// Parse one JSON-line request.
///
/// Two passes: first a generic value lookup so an unrecognized `command`
/// produces "unknown command: foo" rather than serde's generic "unknown
/// variant" message, then a typed decode of the known variant so a missing
/// required field produces a field-specific message.
pub fn parse_request(line: &str) -> Result<Request, ProtocolError> {
    let value: Value = serde_json::from_str(line).map_err(ProtocolError::Json)?;
    let command = value
        .get("command")
        .and_then(Value::as_str)
        .ok_or_else(|| ProtocolError::MissingField("command".to_string()))?;

    if !KNOWN_COMMANDS.contains(&command) {
        return Err(ProtocolError::UnknownCommand(command.to_string()));
    }

    serde_json::from_value(value).map_err(|e| ProtocolError::InvalidRequest(e.to_string()))
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
