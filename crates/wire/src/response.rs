// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The RPC response envelope: `{"status":"ok","data":...}` or
//! `{"status":"error","message":...}` (spec.md §6).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok { data: Value },
    Error { message: String },
}

impl Response {
    /// A successful response carrying `value`, serialized to JSON.
    ///
    /// Infallible in practice: every `value` passed by daemon handlers is a
    /// plain struct/enum, never something serde can fail on (NaN floats,
    /// non-string map keys). Falls back to a null payload rather than
    /// panicking if that ever changes.
    pub fn ok(value: impl Serialize) -> Self {
        let data = serde_json::to_value(value).unwrap_or(Value::Null);
        Response::Ok { data }
    }

    pub fn ok_null() -> Self {
        Response::Ok { data: Value::Null }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error { message: message.into() }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok { .. })
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
