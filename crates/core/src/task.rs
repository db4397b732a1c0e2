// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task data model: identity, status, dependency list, and lease fields.

use serde::{Deserialize, Serialize};

/// Default lease length for a task that doesn't specify one.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

/// A single node in the plan DAG.
///
/// `id` is opaque to the engine: it may be numeric (`"1"`, `"1.1"`) or
/// semantic (`"auth-service"`). Uniqueness is enforced by the containing
/// `WorkflowState` map, not by this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl Task {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            status: TaskStatus::Pending,
            dependencies: Vec::new(),
            started_at: None,
            completed_at: None,
            claimed_by: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            instructions: None,
            role: None,
        }
    }

    /// Whether this task's lease has expired as of `now_ms`.
    ///
    /// Only meaningful for `RUNNING` tasks; callers must check status first.
    pub fn is_timed_out(&self, now_ms: u64) -> bool {
        match self.started_at {
            Some(started) => {
                let deadline = started.saturating_add(self.timeout_seconds.saturating_mul(1000));
                now_ms >= deadline
            }
            None => false,
        }
    }

    /// A task is eligible for a fresh claim if it's pending and every
    /// dependency in `completed` has been satisfied.
    pub fn is_claimable_pending(&self, completed: impl Fn(&str) -> bool) -> bool {
        self.status == TaskStatus::Pending && self.dependencies.iter().all(|d| completed(d.as_str()))
    }

    /// Checks the invariants from spec.md §3 that must hold for a single task
    /// in isolation (cross-task invariants — acyclicity, dependency
    /// existence — are checked at the `WorkflowState` level).
    pub fn check_local_invariants(&self) -> Result<(), String> {
        match self.status {
            TaskStatus::Running => {
                if self.started_at.is_none() || self.claimed_by.is_none() {
                    return Err(format!(
                        "task {} is RUNNING but missing started_at/claimed_by",
                        self.id
                    ));
                }
            }
            TaskStatus::Completed => {
                if self.completed_at.is_none() || self.started_at.is_none() {
                    return Err(format!(
                        "task {} is COMPLETED but missing started_at/completed_at",
                        self.id
                    ));
                }
            }
            TaskStatus::Pending => {
                if self.started_at.is_some() || self.completed_at.is_some() || self.claimed_by.is_some()
                {
                    return Err(format!(
                        "task {} is PENDING but has lease/completion fields set",
                        self.id
                    ));
                }
            }
            TaskStatus::Failed => {}
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
