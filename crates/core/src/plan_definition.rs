// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The plan-import input schema — distinct from [`crate::task::Task`]:
//! no runtime/lease fields, just what a plan author can specify.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::task::{Task, DEFAULT_TIMEOUT_SECONDS};
use crate::workflow_state::WorkflowState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanTaskDefinition {
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

/// Order-preserving: `IndexMap`'s `Deserialize` impl keeps the key order of
/// the source document, which is what seeds the claim scan's insertion
/// order after import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDefinition {
    pub goal: String,
    pub tasks: IndexMap<String, PlanTaskDefinition>,
}

impl PlanDefinition {
    /// Build a fresh `WorkflowState` with every task `PENDING`. This is the
    /// only path that creates tasks — `plan_import` replaces any prior
    /// state wholesale.
    pub fn into_workflow_state(self) -> WorkflowState {
        let tasks = self
            .tasks
            .into_iter()
            .map(|(id, def)| {
                let task = Task {
                    id: id.clone(),
                    description: def.description,
                    status: Default::default(),
                    dependencies: def.dependencies,
                    started_at: None,
                    completed_at: None,
                    claimed_by: None,
                    timeout_seconds: def.timeout_seconds,
                    instructions: def.instructions,
                    role: def.role,
                };
                (id, task)
            })
            .collect();
        WorkflowState::new(self.goal, tasks)
    }
}

#[cfg(test)]
#[path = "plan_definition_tests.rs"]
mod tests;
