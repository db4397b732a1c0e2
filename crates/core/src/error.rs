// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed error taxonomy shared across the workspace.
//!
//! Every fallible operation in the state engine, plan parser, and runtime
//! returns a variant of [`KernelError`]. The daemon is the only place these
//! get turned into strings (the RPC error envelope); library code never
//! formats an error for a human except via `Display`.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KernelError {
    /// No plan has been imported yet. Surfaced to RPC callers as `{status:"ok", data:null}`,
    /// not as an error envelope — see daemon dispatch.
    #[error("no workflow loaded")]
    NoWorkflow,

    #[error("unknown task: {0}")]
    UnknownTask(String),

    #[error("task {task_id} not claimed by {worker_id}")]
    NotOwner { task_id: String, worker_id: String },

    #[error("dependency cycle detected involving task {0}")]
    Cycle(String),

    #[error("task {task} depends on unknown task {dependency}")]
    MissingDependency { task: String, dependency: String },

    #[error("task {task} lists duplicate dependency {dependency}")]
    DuplicateDependency { task: String, dependency: String },

    #[error("task {0} cannot depend on itself")]
    SelfDependency(String),

    #[error("goal not specified")]
    GoalNotSpecified,

    #[error("orphan task(s) not listed in any group: {0:?}")]
    OrphanTasks(Vec<String>),

    #[error(
        "phantom task(s) referenced in the group table with no matching heading \
         (check for typos in headings): {0:?}"
    )]
    PhantomTasks(Vec<String>),

    #[error("could not recognize plan document format (no Markdown goal/group table and no fenced JSON object)")]
    UnrecognizedFormat,

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("unknown or incompatible field update: {0}")]
    InvalidUpdate(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to spawn command: {0}")]
    Spawn(String),

    #[error("lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, KernelError>;
