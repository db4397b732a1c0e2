// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One function per CLI subcommand. Each opens a connection (spawning the
//! daemon if needed), sends one request, and prints the result.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use tk_wire::{Request, Response};

use crate::client::DaemonClient;
use crate::color;
use crate::daemon_process;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};
use crate::socket_target::SocketTarget;

fn connect(target: &SocketTarget) -> Result<DaemonClient> {
    DaemonClient::connect_or_spawn(&target.socket, &target.worktree)
        .map_err(|e| anyhow!(ExitError::new(1, e.to_string())))
}

fn ok_data(response: Response) -> Result<serde_json::Value> {
    match response {
        Response::Ok { data } => Ok(data),
        Response::Error { message } => Err(anyhow!(ExitError::new(1, message))),
    }
}

pub fn ping(target: &SocketTarget, format: OutputFormat) -> Result<()> {
    let mut client = connect(target)?;
    let data = ok_data(client.send(&Request::Ping)?)?;
    format_or_json(format, &data, || {
        let pid = data.get("pid").and_then(|v| v.as_u64()).unwrap_or(0);
        println!("tkd is running (pid {pid})");
    })
}

pub fn state(target: &SocketTarget, format: OutputFormat) -> Result<()> {
    let mut client = connect(target)?;
    let data = ok_data(client.send(&Request::GetState)?)?;
    format_or_json(format, &data, || {
        if data.is_null() {
            println!("No plan imported yet.");
        } else {
            println!("{}", serde_json::to_string_pretty(&data).unwrap_or_default());
        }
    })
}

pub fn set_state(target: &SocketTarget, format: OutputFormat, updates_json: &str) -> Result<()> {
    let value: serde_json::Value =
        serde_json::from_str(updates_json).context("updates must be a JSON object")?;
    let updates = value
        .as_object()
        .cloned()
        .ok_or_else(|| anyhow!(ExitError::new(2, "updates must be a JSON object")))?;
    let mut client = connect(target)?;
    let data = ok_data(client.send(&Request::UpdateState { updates })?)?;
    format_or_json(format, &data, || {
        println!("{}", serde_json::to_string_pretty(&data).unwrap_or_default());
    })
}

pub fn plan_import(target: &SocketTarget, format: OutputFormat, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read plan file {}", path.display()))?;
    let mut client = connect(target)?;
    let data = ok_data(client.send(&Request::PlanImport { content })?)?;
    format_or_json(format, &data, || {
        let goal = data.get("goal").and_then(|v| v.as_str()).unwrap_or("");
        let task_count = data.get("task_count").and_then(|v| v.as_u64()).unwrap_or(0);
        println!("Imported plan: {goal} ({task_count} tasks)");
    })
}

pub fn claim(target: &SocketTarget, format: OutputFormat, worker_id: &str) -> Result<()> {
    let mut client = connect(target)?;
    let data = ok_data(client.send(&Request::TaskClaim { worker_id: worker_id.to_string() })?)?;
    format_or_json(format, &data, || {
        if data.is_null() {
            println!("No claimable task.");
        } else {
            let task_id = data.get("task_id").and_then(|v| v.as_str()).unwrap_or("?");
            let description = data.get("description").and_then(|v| v.as_str()).unwrap_or("");
            println!("Claimed {task_id}: {description}");
        }
    })
}

pub fn complete(
    target: &SocketTarget,
    format: OutputFormat,
    task_id: &str,
    worker_id: &str,
) -> Result<()> {
    let mut client = connect(target)?;
    let data = ok_data(client.send(&Request::TaskComplete {
        task_id: task_id.to_string(),
        worker_id: worker_id.to_string(),
    })?)?;
    format_or_json(format, &data, || println!("Completed {task_id}"))
}

pub fn fail(
    target: &SocketTarget,
    format: OutputFormat,
    task_id: &str,
    worker_id: &str,
    reason: Option<String>,
) -> Result<()> {
    let mut client = connect(target)?;
    let data = ok_data(client.send(&Request::TaskFail {
        task_id: task_id.to_string(),
        worker_id: worker_id.to_string(),
        reason,
    })?)?;
    format_or_json(format, &data, || println!("Failed {task_id}"))
}

pub fn list(target: &SocketTarget, format: OutputFormat, limit: usize, no_limit: bool) -> Result<()> {
    let mut client = connect(target)?;
    let data = ok_data(client.send(&Request::ListTasks)?)?;
    let mut tasks = data.as_array().cloned().unwrap_or_default();
    let truncation = crate::output::apply_limit(&mut tasks, limit, no_limit);
    crate::output::handle_list_with_limit(format, &tasks, "No tasks.", truncation, |items, out| {
        for task in items {
            let id = task.get("id").and_then(|v| v.as_str()).unwrap_or("?");
            let status = task.get("status").and_then(|v| v.as_str()).unwrap_or("?");
            let description = task.get("description").and_then(|v| v.as_str()).unwrap_or("");
            let _ = writeln!(
                out,
                "{} {} {}",
                color::header(&format!("{id:<12}")),
                color::context(&format!("{status:<12}")),
                color::muted(description)
            );
        }
    })
}

#[allow(clippy::too_many_arguments)]
pub fn exec(
    target: &SocketTarget,
    format: OutputFormat,
    args: Vec<String>,
    cwd: Option<String>,
    env: Option<HashMap<String, String>>,
    timeout: Option<u64>,
) -> Result<()> {
    if args.is_empty() {
        return Err(anyhow!(ExitError::new(2, "exec requires at least one argument")));
    }
    let cwd = cwd.unwrap_or_else(|| target.worktree.display().to_string());
    let mut client = connect(target)?;
    let data = ok_data(client.send(&Request::Exec { args, cwd, env, timeout })?)?;
    print_exec_result(format, &data)
}

pub fn git(target: &SocketTarget, format: OutputFormat, args: Vec<String>, cwd: Option<String>) -> Result<()> {
    if args.is_empty() {
        return Err(anyhow!(ExitError::new(2, "git requires at least one argument")));
    }
    let cwd = cwd.unwrap_or_else(|| target.worktree.display().to_string());
    let mut client = connect(target)?;
    let data = ok_data(client.send(&Request::Git { args, cwd })?)?;
    print_exec_result(format, &data)
}

fn print_exec_result(format: OutputFormat, data: &serde_json::Value) -> Result<()> {
    format_or_json(format, data, || {
        if let Some(stdout) = data.get("stdout").and_then(|v| v.as_str()) {
            print!("{stdout}");
        }
        if let Some(stderr) = data.get("stderr").and_then(|v| v.as_str()) {
            eprint!("{stderr}");
        }
    })?;
    let returncode = data.get("returncode").and_then(|v| v.as_i64()).unwrap_or(1);
    if returncode != 0 {
        return Err(anyhow!(ExitError::new(returncode as i32, "command exited non-zero")));
    }
    Ok(())
}

pub fn shutdown(target: &SocketTarget, format: OutputFormat) -> Result<()> {
    let mut client = DaemonClient::connect(&target.socket)
        .map_err(|e| anyhow!(ExitError::new(1, e.to_string())))?;
    let data = ok_data(client.send(&Request::Shutdown)?)?;
    format_or_json(format, &data, || println!("Shutdown requested."))
}

pub fn daemon_start(target: &SocketTarget) -> Result<()> {
    if DaemonClient::connect(&target.socket).is_ok() {
        println!("Daemon already running.");
        return Ok(());
    }
    daemon_process::spawn_background(&target.worktree)
        .map_err(|e| anyhow!(ExitError::new(1, e.to_string())))?;
    daemon_process::wait_for_socket(&target.socket, std::time::Duration::from_secs(5))
        .map_err(|e| anyhow!(ExitError::new(1, e.to_string())))?;
    println!("Daemon started.");
    Ok(())
}

pub fn daemon_stop(target: &SocketTarget) -> Result<()> {
    let mut client = match DaemonClient::connect(&target.socket) {
        Ok(c) => c,
        Err(_) => {
            println!("Daemon not running.");
            return Ok(());
        }
    };
    ok_data(client.send(&Request::Shutdown)?)?;
    println!("Daemon stopped.");
    Ok(())
}

pub fn daemon_status(target: &SocketTarget, format: OutputFormat) -> Result<()> {
    match DaemonClient::connect(&target.socket) {
        Ok(mut client) => {
            let data = ok_data(client.send(&Request::Ping)?)?;
            format_or_json(format, &data, || {
                let pid = data.get("pid").and_then(|v| v.as_u64()).unwrap_or(0);
                println!("{} {}", color::header("running"), color::muted(&format!("(pid {pid})")));
            })
        }
        Err(_) => {
            let obj = serde_json::json!({ "status": "not_running" });
            format_or_json(format, &obj, || println!("{}", color::context("not running")))
        }
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
