// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fallback form (spec.md §4.5): a fenced code block containing a JSON
//! object matching the `PlanDefinition` schema.

use serde_json::Value;
use tk_core::{KernelError, PlanDefinition, Result};

/// Find the first fenced code block whose contents parse as a JSON object.
pub fn extract_fenced_json(document: &str) -> Option<String> {
    let mut in_fence = false;
    let mut buf = String::new();

    for line in document.lines() {
        if line.trim_start().starts_with("```") {
            if in_fence {
                let candidate = buf.trim();
                if candidate.starts_with('{')
                    && serde_json::from_str::<Value>(candidate).map(|v| v.is_object()).unwrap_or(false)
                {
                    return Some(candidate.to_string());
                }
                buf.clear();
            } else {
                buf.clear();
            }
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            buf.push_str(line);
            buf.push('\n');
        }
    }
    None
}

pub fn parse(json: &str) -> Result<PlanDefinition> {
    serde_json::from_str(json).map_err(KernelError::from)
}

#[cfg(test)]
#[path = "json_fallback_tests.rs"]
mod tests;
