// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The durable, whole-plan snapshot persisted to `dev-workflow-state.json`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::task::Task;

/// id → Task, plus plan-level metadata. `IndexMap` preserves insertion order
/// so `claim_task`'s "first claimable task in insertion order" scan is
/// well-defined and matches `plan_import`'s task declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowState {
    pub tasks: IndexMap<String, Task>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub plan_source: Option<String>,
    #[serde(default)]
    pub base_commit: Option<String>,
    #[serde(default)]
    pub last_commit: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl WorkflowState {
    pub fn new(goal: impl Into<String>, tasks: IndexMap<String, Task>) -> Self {
        Self {
            tasks,
            goal: Some(goal.into()),
            plan_source: None,
            base_commit: None,
            last_commit: None,
            kind: None,
            enabled: true,
        }
    }

    /// Validate every invariant from spec.md §3 / §8 that must hold for a
    /// persisted state: dependency existence, no duplicate or self
    /// dependencies, acyclicity, and each task's local status/lease-field
    /// invariants.
    pub fn validate(&self) -> Result<()> {
        for task in self.tasks.values() {
            task.check_local_invariants()
                .map_err(KernelError::InvalidPlan)?;

            let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();
            for dep in &task.dependencies {
                if dep == &task.id {
                    return Err(KernelError::SelfDependency(task.id.clone()));
                }
                if !self.tasks.contains_key(dep) {
                    return Err(KernelError::MissingDependency {
                        task: task.id.clone(),
                        dependency: dep.clone(),
                    });
                }
                if !seen.insert(dep.as_str()) {
                    return Err(KernelError::DuplicateDependency {
                        task: task.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }
        self.check_acyclic()
    }

    /// Iterative grey/white/black DFS cycle detection over `{t -> d : d in
    /// t.dependencies}`. Iterative so plan depth is not bounded by the call
    /// stack.
    fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Grey,
            Black,
        }

        let mut colors: std::collections::HashMap<&str, Color> = self
            .tasks
            .keys()
            .map(|k| (k.as_str(), Color::White))
            .collect();

        for start in self.tasks.keys() {
            if colors[start.as_str()] != Color::White {
                continue;
            }
            // Stack of (node, next-dependency-index-to-visit).
            let mut stack: Vec<(&str, usize)> = vec![(start.as_str(), 0)];
            colors.insert(start.as_str(), Color::Grey);

            while let Some((node, idx)) = stack.last().copied() {
                let deps = &self.tasks[node].dependencies;
                if idx < deps.len() {
                    let dep = deps[idx].as_str();
                    let top = stack.len() - 1;
                    stack[top].1 += 1;
                    match colors.get(dep).copied() {
                        Some(Color::Grey) => return Err(KernelError::Cycle(dep.to_string())),
                        Some(Color::White) => {
                            colors.insert(dep, Color::Grey);
                            stack.push((dep, 0));
                        }
                        _ => {}
                    }
                } else {
                    colors.insert(node, Color::Black);
                    stack.pop();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "workflow_state_tests.rs"]
mod tests;
