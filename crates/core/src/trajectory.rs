// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Construction helpers for trajectory events.
//!
//! A trajectory event is, by convention, an arbitrary JSON object
//! (spec.md §3) — not a fixed struct — so callers that want to log a new
//! kind of event never have to touch this crate. These helpers just keep
//! the common fields (`event`, `task_id`, `worker_id`, `timestamp`)
//! consistently named and typed.

use serde_json::{json, Map, Value};

/// Build a trajectory event object. `extra` fields are merged in on top of
/// the conventional ones; a key collision lets the caller override
/// `event`/`timestamp` if it genuinely needs to (none of the current
/// daemon handlers do).
pub fn event(
    kind: &str,
    task_id: Option<&str>,
    worker_id: Option<&str>,
    timestamp_ms: u64,
    extra: Map<String, Value>,
) -> Value {
    let mut obj = Map::new();
    obj.insert("event".to_string(), json!(kind));
    obj.insert("timestamp".to_string(), json!(timestamp_ms));
    if let Some(t) = task_id {
        obj.insert("task_id".to_string(), json!(t));
    }
    if let Some(w) = worker_id {
        obj.insert("worker_id".to_string(), json!(w));
    }
    for (k, v) in extra {
        obj.insert(k, v);
    }
    Value::Object(obj)
}
