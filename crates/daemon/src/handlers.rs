// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request dispatch (spec.md §4.7's handler table). One function per
//! command, all sharing the lock-hierarchy discipline from spec.md §5:
//! persist under the state lock, release, *then* log trajectory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tk_core::{Clock, KernelError, SystemClock};
use tk_runtime::{ExclusiveLock, Runtime};
use tk_storage::{StateEngine, TrajectoryLogger};
use tk_wire::{Request, Response};

const DEFAULT_EXEC_TIMEOUT_SECS: u64 = 600;

pub struct AppState {
    pub state_engine: StateEngine,
    pub trajectory: TrajectoryLogger,
    pub runtime: Arc<dyn Runtime>,
    pub exec_lock: ExclusiveLock,
    pub pid: u32,
    pub shutdown_requested: Arc<AtomicBool>,
}

pub fn dispatch(app: &AppState, request: Request) -> Response {
    match request {
        Request::Ping => Response::ok(json!({ "running": true, "pid": app.pid })),
        Request::GetState => get_state(app),
        Request::UpdateState { updates } => update_state(app, &updates),
        Request::PlanImport { content } => plan_import(app, &content),
        Request::TaskClaim { worker_id } => task_claim(app, &worker_id),
        Request::TaskComplete { task_id, worker_id } => task_complete(app, &task_id, &worker_id),
        Request::TaskFail { task_id, worker_id, reason } => task_fail(app, &task_id, &worker_id, reason),
        Request::ListTasks => list_tasks(app),
        Request::Exec { args, cwd, env, timeout } => {
            exec(app, "exec", &args, &cwd, env, timeout, false)
        }
        Request::Git { args, cwd } => {
            let mut full_args = vec!["git".to_string()];
            full_args.extend(args);
            exec(app, "git", &full_args, &cwd, None, None, true)
        }
        Request::Shutdown => {
            app.shutdown_requested.store(true, Ordering::SeqCst);
            Response::ok(json!({ "shutdown": true }))
        }
    }
}

fn from_kernel_error(err: KernelError) -> Response {
    Response::error(err.to_string())
}

fn get_state(app: &AppState) -> Response {
    match app.state_engine.get_state() {
        Ok(Some(state)) => Response::ok(state),
        Ok(None) => Response::ok_null(),
        Err(e) => from_kernel_error(e),
    }
}

fn update_state(app: &AppState, updates: &serde_json::Map<String, serde_json::Value>) -> Response {
    match app.state_engine.update_state(updates) {
        Ok(state) => Response::ok(state),
        Err(e) => from_kernel_error(e),
    }
}

fn plan_import(app: &AppState, content: &str) -> Response {
    let plan = match tk_plan::parse_plan(content) {
        Ok(p) => p,
        Err(e) => return from_kernel_error(e),
    };
    match app.state_engine.import_plan(plan) {
        Ok(state) => {
            let task_ids: Vec<&str> = state.tasks.keys().map(String::as_str).collect();
            log_event(
                app,
                json!({
                    "event": "plan_import",
                    "timestamp": SystemClock.epoch_ms(),
                    "goal": state.goal,
                    "task_count": state.tasks.len(),
                }),
            );
            Response::ok(json!({
                "goal": state.goal,
                "task_count": state.tasks.len(),
                "task_ids": task_ids,
            }))
        }
        Err(e) => from_kernel_error(e),
    }
}

fn task_claim(app: &AppState, worker_id: &str) -> Response {
    match app.state_engine.claim_task(worker_id) {
        Ok(Some(outcome)) => {
            let event_name = if outcome.is_reclaim { "reclaim" } else { "claim" };
            let mut event = json!({
                "event": event_name,
                "timestamp": SystemClock.epoch_ms(),
                "task_id": outcome.task.id,
                "worker_id": worker_id,
                "is_retry": outcome.is_retry,
                "is_reclaim": outcome.is_reclaim,
            });
            if outcome.is_reclaim {
                let retry_count = count_events_for_task(app, &outcome.task.id);
                event["retry_count"] = json!(retry_count);
            }
            log_event(app, event);
            Response::ok(json!({
                "task_id": outcome.task.id,
                "description": outcome.task.description,
                "is_retry": outcome.is_retry,
                "is_reclaim": outcome.is_reclaim,
            }))
        }
        Ok(None) => Response::ok_null(),
        Err(e) => from_kernel_error(e),
    }
}

fn task_complete(app: &AppState, task_id: &str, worker_id: &str) -> Response {
    match app.state_engine.complete_task(task_id, worker_id) {
        Ok(task) => {
            log_event(
                app,
                json!({
                    "event": "complete",
                    "timestamp": SystemClock.epoch_ms(),
                    "task_id": task.id,
                    "worker_id": worker_id,
                }),
            );
            Response::ok(json!({ "task_id": task.id }))
        }
        Err(e) => from_kernel_error(e),
    }
}

fn task_fail(app: &AppState, task_id: &str, worker_id: &str, reason: Option<String>) -> Response {
    match app.state_engine.fail_task(task_id, worker_id) {
        Ok(task) => {
            log_event(
                app,
                json!({
                    "event": "fail",
                    "timestamp": SystemClock.epoch_ms(),
                    "task_id": task.id,
                    "worker_id": worker_id,
                    "reason": reason,
                }),
            );
            Response::ok(json!({ "task_id": task.id }))
        }
        Err(e) => from_kernel_error(e),
    }
}

fn list_tasks(app: &AppState) -> Response {
    match app.state_engine.get_state() {
        Ok(Some(state)) => {
            let tasks: Vec<_> = state.tasks.values().cloned().collect();
            Response::ok(tasks)
        }
        Ok(None) => Response::ok_null(),
        Err(e) => from_kernel_error(e),
    }
}

#[allow(clippy::too_many_arguments)]
fn exec(
    app: &AppState,
    event_name: &str,
    args: &[String],
    cwd: &str,
    env: Option<std::collections::HashMap<String, String>>,
    timeout: Option<u64>,
    exclusive: bool,
) -> Response {
    let timeout = Duration::from_secs(timeout.unwrap_or(DEFAULT_EXEC_TIMEOUT_SECS));
    match app.runtime.execute(args, cwd, timeout, env.as_ref(), exclusive, &app.exec_lock) {
        Ok(result) => {
            log_event(
                app,
                json!({
                    "event": event_name,
                    "timestamp": SystemClock.epoch_ms(),
                    "args": args,
                    "cwd": cwd,
                    "returncode": result.exit_code,
                    "signal_name": result.signal_name,
                }),
            );
            Response::ok(json!({
                "returncode": result.exit_code,
                "stdout": result.stdout,
                "stderr": result.stderr,
                "signal_name": result.signal_name,
            }))
        }
        Err(e) => from_kernel_error(e),
    }
}

/// Best-effort count of prior trajectory events naming `task_id`, used only
/// to annotate a `reclaim` event with how many times this task has been
/// attempted. Bounded by the logger's memory cap, so an extremely long
/// trajectory undercounts rather than reading the whole file.
fn count_events_for_task(app: &AppState, task_id: &str) -> usize {
    app.trajectory
        .tail(usize::MAX)
        .map(|events| {
            events
                .iter()
                .filter(|e| e.get("task_id").and_then(|v| v.as_str()) == Some(task_id))
                .count()
        })
        .unwrap_or(0)
}

fn log_event(app: &AppState, event: serde_json::Value) {
    if let Err(e) = app.trajectory.log(&event) {
        tracing::warn!(error = %e, "failed to append trajectory event");
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
