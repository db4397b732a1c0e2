// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tk`: the thin RPC client for the per-worktree `tkd` daemon. Does no
//! schema validation itself — every coercion happens daemon-side, on the
//! socket the daemon already trusts.

mod client;
mod color;
mod commands;
mod daemon_process;
mod exit_error;
mod output;
mod socket_target;

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};

use exit_error::ExitError;
use output::OutputFormat;
use socket_target::SocketTarget;

#[derive(Parser)]
#[command(
    name = "tk",
    version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH")),
    about = "Client for the per-worktree task-execution daemon"
)]
struct Cli {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text", global = true)]
    output: OutputFormat,

    /// Worker id to use for claim/complete/fail (defaults to a persisted,
    /// process-stable identity; see TK_WORKER_ID_FILE)
    #[arg(long, global = true)]
    worker_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the daemon is reachable
    Ping,
    /// Print the current workflow state
    State,
    /// Apply a field-wise update to the workflow state
    SetState {
        /// JSON object of fields to update, e.g. '{"goal":"ship it"}'
        updates: String,
    },
    /// Import a plan (Markdown or JSON) and overwrite the current state
    PlanImport {
        /// Path to the plan file
        file: PathBuf,
    },
    /// Claim the next available task
    Claim,
    /// Mark a task complete
    Complete {
        task_id: String,
    },
    /// Mark a task failed
    Fail {
        task_id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// List all tasks in the current plan
    List {
        /// Number of tasks to show
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: usize,
        /// Show all tasks (no limit)
        #[arg(long, conflicts_with = "limit")]
        no_limit: bool,
    },
    /// Run a command through the daemon's runtime
    Exec {
        #[arg(long)]
        cwd: Option<String>,
        #[arg(long)]
        timeout: Option<u64>,
        #[arg(long = "env", value_parser = parse_env_kv)]
        env: Vec<(String, String)>,
        #[arg(last = true, required = true)]
        args: Vec<String>,
    },
    /// Run a version-control command exclusively through the daemon
    Git {
        #[arg(long)]
        cwd: Option<String>,
        #[arg(last = true, required = true)]
        args: Vec<String>,
    },
    /// Request an orderly daemon shutdown
    Shutdown,
    /// Manage the background daemon process
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
}

#[derive(Subcommand)]
enum DaemonCommand {
    /// Start the daemon in the background if it isn't already running
    Start,
    /// Request an orderly daemon shutdown
    Stop,
    /// Check whether the daemon is running
    Status,
}

fn parse_env_kv(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(exit) = e.downcast_ref::<ExitError>() {
                eprintln!("tk: {}", exit.message);
                return ExitCode::from(exit.code.clamp(1, 255) as u8);
            }
            eprintln!("tk: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let matches = match Cli::command().styles(color::styles()).try_get_matches() {
        Ok(m) => m,
        Err(e) => e.exit(),
    };
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };
    let target = SocketTarget::resolve()?;
    let format = cli.output;

    match cli.command {
        Commands::Ping => commands::ping(&target, format),
        Commands::State => commands::state(&target, format),
        Commands::SetState { updates } => commands::set_state(&target, format, &updates),
        Commands::PlanImport { file } => commands::plan_import(&target, format, &file),
        Commands::Claim => {
            let worker_id = resolve_worker_id(&cli.worker_id, &target)?;
            commands::claim(&target, format, &worker_id)
        }
        Commands::Complete { task_id } => {
            let worker_id = resolve_worker_id(&cli.worker_id, &target)?;
            commands::complete(&target, format, &task_id, &worker_id)
        }
        Commands::Fail { task_id, reason } => {
            let worker_id = resolve_worker_id(&cli.worker_id, &target)?;
            commands::fail(&target, format, &task_id, &worker_id, reason)
        }
        Commands::List { limit, no_limit } => commands::list(&target, format, limit, no_limit),
        Commands::Exec { cwd, timeout, env, args } => {
            let env = if env.is_empty() { None } else { Some(env.into_iter().collect::<HashMap<_, _>>()) };
            commands::exec(&target, format, args, cwd, env, timeout)
        }
        Commands::Git { cwd, args } => commands::git(&target, format, args, cwd),
        Commands::Shutdown => commands::shutdown(&target, format),
        Commands::Daemon { command } => match command {
            DaemonCommand::Start => commands::daemon_start(&target),
            DaemonCommand::Stop => commands::daemon_stop(&target),
            DaemonCommand::Status => commands::daemon_status(&target, format),
        },
    }
}

/// Resolve this process's worker id: an explicit `--worker-id` flag wins,
/// otherwise fall back to the persisted/generated identity from
/// `tk_core::worker_id` (spec.md §4.8). Since `tk` is a short-lived process
/// re-invoked per command, persistence defaults to a file under the
/// worktree so a `claim` followed by a later `complete` reuses the same id.
fn resolve_worker_id(flag: &Option<String>, target: &SocketTarget) -> anyhow::Result<String> {
    if let Some(id) = flag {
        return Ok(id.clone());
    }
    let default_path = target.worktree.join(".claude").join("worker-id");
    let path = tk_daemon::env::worker_id_file().unwrap_or(default_path);
    Ok(tk_core::worker_id::resolve(Some(&path))?)
}
