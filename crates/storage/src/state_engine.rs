// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The State Engine: single-owner, lock-protected `WorkflowState` plus
//! durable JSON persistence (spec.md §4.6).
//!
//! Every public method here is one atomic critical section: acquire the
//! state lock, read/mutate a clone, persist, swap the clone into place,
//! release. Persisting before swapping means a failed `fsync`/`rename`
//! never leaves the in-memory copy ahead of what's on disk.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tk_core::{Clock, KernelError, PlanDefinition, Result, SystemClock, Task, TaskStatus, WorkflowState};

use crate::persist::atomic_write_json;

/// Outcome of a `claim_task` call, carrying the flags spec.md §6 requires
/// RPC consumers to rely on.
#[derive(Debug, Clone)]
pub struct ClaimOutcome {
    pub task: Task,
    pub is_retry: bool,
    pub is_reclaim: bool,
}

pub struct StateEngine<C: Clock = SystemClock> {
    path: PathBuf,
    state: Mutex<Option<WorkflowState>>,
    clock: C,
}

impl StateEngine<SystemClock> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, SystemClock)
    }
}

impl<C: Clock> StateEngine<C> {
    pub fn with_clock(path: impl Into<PathBuf>, clock: C) -> Self {
        Self { path: path.into(), state: Mutex::new(None), clock }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_from_disk(&self) -> Result<WorkflowState> {
        let bytes = std::fs::read(&self.path)?;
        let state: WorkflowState = serde_json::from_slice(&bytes)?;
        Ok(state)
    }

    /// Populate the in-memory slot from disk if it's empty and a state file
    /// exists. Leaves it `None` if no file has ever been written — that's
    /// the "no workflow" condition, not an error.
    fn ensure_loaded(&self, slot: &mut Option<WorkflowState>) -> Result<()> {
        if slot.is_none() && self.path.exists() {
            *slot = Some(self.load_from_disk()?);
        }
        Ok(())
    }

    fn persist(&self, state: &WorkflowState) -> Result<()> {
        state.validate()?;
        atomic_write_json(&self.path, state)?;
        Ok(())
    }

    /// Deep copy of the current state, loading from disk first if needed.
    /// `None` means no plan has ever been imported.
    pub fn get_state(&self) -> Result<Option<WorkflowState>> {
        let mut slot = self.state.lock();
        self.ensure_loaded(&mut slot)?;
        Ok(slot.clone())
    }

    /// Replace all state with a freshly parsed plan. Validates before
    /// persisting; on failure the previous state (in memory and on disk) is
    /// untouched.
    pub fn import_plan(&self, plan: PlanDefinition) -> Result<WorkflowState> {
        let next = plan.into_workflow_state();
        self.persist(&next)?;
        let mut slot = self.state.lock();
        *slot = Some(next.clone());
        Ok(next)
    }

    /// Field-wise update of plan-level metadata. Only `goal` (string or
    /// null) and `enabled` (bool) are recognized; anything else rejects
    /// per spec.md §9's Open Question resolution (reject unknown/
    /// type-incompatible fields rather than silently coerce).
    pub fn update_state(&self, updates: &Map<String, Value>) -> Result<WorkflowState> {
        let mut slot = self.state.lock();
        self.ensure_loaded(&mut slot)?;
        let current = slot.as_ref().ok_or(KernelError::NoWorkflow)?;
        let mut next = current.clone();
        for (key, value) in updates {
            match key.as_str() {
                "goal" => match value {
                    Value::String(s) => next.goal = Some(s.clone()),
                    Value::Null => next.goal = None,
                    other => {
                        return Err(KernelError::InvalidUpdate(format!(
                            "goal must be a string or null, got {other}"
                        )))
                    }
                },
                "enabled" => match value {
                    Value::Bool(b) => next.enabled = *b,
                    other => {
                        return Err(KernelError::InvalidUpdate(format!(
                            "enabled must be a boolean, got {other}"
                        )))
                    }
                },
                other => return Err(KernelError::InvalidUpdate(format!("unknown field: {other}"))),
            }
        }
        self.persist(&next)?;
        *slot = Some(next.clone());
        Ok(next)
    }

    /// Atomic claim critical section (spec.md §4.6). Covers idempotent
    /// retry (lease renewal), fresh claim, and reclaim-of-zombie in a
    /// single insertion-order scan.
    pub fn claim_task(&self, worker_id: &str) -> Result<Option<ClaimOutcome>> {
        let mut slot = self.state.lock();
        self.ensure_loaded(&mut slot)?;
        let Some(current) = slot.as_ref() else {
            return Ok(None);
        };
        let now = self.clock.epoch_ms();
        let mut next = current.clone();

        // Idempotency check: a task this worker already owns and hasn't
        // timed out is returned again, with its lease renewed.
        if let Some(owned_id) = next
            .tasks
            .iter()
            .find(|(_, t)| {
                t.status == TaskStatus::Running
                    && t.claimed_by.as_deref() == Some(worker_id)
                    && !t.is_timed_out(now)
            })
            .map(|(id, _)| id.clone())
        {
            let task = next
                .tasks
                .get_mut(&owned_id)
                .ok_or_else(|| KernelError::UnknownTask(owned_id.clone()))?;
            task.started_at = Some(now);
            let claimed = task.clone();
            self.persist(&next)?;
            *slot = Some(next);
            return Ok(Some(ClaimOutcome { task: claimed, is_retry: true, is_reclaim: false }));
        }

        let completed: std::collections::HashSet<&str> = next
            .tasks
            .iter()
            .filter(|(_, t)| t.status == TaskStatus::Completed)
            .map(|(id, _)| id.as_str())
            .collect();

        let mut selection: Option<(String, bool)> = None;
        for (id, task) in next.tasks.iter() {
            if task.is_claimable_pending(|d| completed.contains(d)) {
                selection = Some((id.clone(), false));
                break;
            }
            if task.status == TaskStatus::Running && task.is_timed_out(now) {
                selection = Some((id.clone(), true));
                break;
            }
        }

        let Some((id, is_reclaim)) = selection else {
            return Ok(None);
        };
        let task = next.tasks.get_mut(&id).ok_or_else(|| KernelError::UnknownTask(id.clone()))?;
        task.status = TaskStatus::Running;
        task.started_at = Some(now);
        task.claimed_by = Some(worker_id.to_string());
        let claimed = task.clone();
        self.persist(&next)?;
        *slot = Some(next);
        Ok(Some(ClaimOutcome { task: claimed, is_retry: false, is_reclaim }))
    }

    /// Atomic completion. Fails if the task doesn't exist or isn't owned by
    /// `worker_id` — ownership validation happens before any mutation.
    pub fn complete_task(&self, task_id: &str, worker_id: &str) -> Result<Task> {
        let mut slot = self.state.lock();
        self.ensure_loaded(&mut slot)?;
        let current = slot.as_ref().ok_or(KernelError::NoWorkflow)?;
        let mut next = current.clone();
        let task = next
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| KernelError::UnknownTask(task_id.to_string()))?;
        if task.claimed_by.as_deref() != Some(worker_id) {
            return Err(KernelError::NotOwner {
                task_id: task_id.to_string(),
                worker_id: worker_id.to_string(),
            });
        }
        task.status = TaskStatus::Completed;
        task.completed_at = Some(self.clock.epoch_ms());
        let completed = task.clone();
        self.persist(&next)?;
        *slot = Some(next);
        Ok(completed)
    }

    /// Atomic fail, symmetric with `complete_task` (spec.md §4.6, "Fail /
    /// update. Analogous atomic mutators may be exposed").
    pub fn fail_task(&self, task_id: &str, worker_id: &str) -> Result<Task> {
        let mut slot = self.state.lock();
        self.ensure_loaded(&mut slot)?;
        let current = slot.as_ref().ok_or(KernelError::NoWorkflow)?;
        let mut next = current.clone();
        let task = next
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| KernelError::UnknownTask(task_id.to_string()))?;
        if task.claimed_by.as_deref() != Some(worker_id) {
            return Err(KernelError::NotOwner {
                task_id: task_id.to_string(),
                worker_id: worker_id.to_string(),
            });
        }
        task.status = TaskStatus::Failed;
        task.completed_at = Some(self.clock.epoch_ms());
        let failed = task.clone();
        self.persist(&next)?;
        *slot = Some(next);
        Ok(failed)
    }
}

#[cfg(test)]
#[path = "state_engine_tests.rs"]
mod tests;
