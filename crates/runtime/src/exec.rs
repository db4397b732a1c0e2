// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution: local and containerized variants behind a shared
//! trait, global exclusive-execution lock, and timeout enforcement
//! (spec.md §4.3).

use std::collections::HashMap;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tk_core::{KernelError, Result};

use crate::path_mapper::PathMapper;
use crate::signal;

/// Output cap per stream; a runaway command can't exhaust daemon memory.
/// Truncation is noted on the result, not treated as an error.
const DEFAULT_OUTPUT_CAP: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ExecResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub signal_name: Option<String>,
    pub stdout_truncated: bool,
    pub stderr_truncated: bool,
}

/// One process-wide mutex shared by every `Runtime` invoked with
/// `exclusive = true` (spec.md §5's "global execution lock"). Constructed
/// once in `tkd::main` and passed down by `Arc`, never a global/static.
#[derive(Clone, Default)]
pub struct ExclusiveLock(Arc<Mutex<()>>);

impl ExclusiveLock {
    pub fn new() -> Self {
        Self::default()
    }
}

pub trait Runtime: Send + Sync {
    /// Build the `Command` to run. `env` is handed in so a containerized
    /// variant can translate it into per-variable `-e` flags; a local
    /// variant can ignore it and rely on the overlay below instead.
    fn build_command(&self, args: &[String], cwd: &str, env: Option<&HashMap<String, String>>) -> Command;

    fn path_mapper(&self) -> &PathMapper;

    fn execute(
        &self,
        args: &[String],
        cwd: &str,
        timeout: Duration,
        env: Option<&HashMap<String, String>>,
        exclusive: bool,
        lock: &ExclusiveLock,
    ) -> Result<ExecResult> {
        if args.is_empty() {
            return Err(KernelError::Spawn("command args must not be empty".to_string()));
        }
        let mapped_cwd = self.path_mapper().to_execution(cwd);
        let mut command = self.build_command(args, &mapped_cwd, env);
        command.current_dir(&mapped_cwd);
        // `envs` overlays on top of the inherited ambient environment —
        // ambient wins for anything not explicitly set. For the local
        // variant this is how env reaches the child; containerized
        // variants instead fold env into `-e` flags in `build_command`,
        // so this overlay only affects the `docker` CLI invocation itself.
        if let Some(env) = env {
            command.envs(env);
        }
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let _guard = if exclusive { Some(lock.0.lock()) } else { None };

        let mut child = command.spawn().map_err(|e| KernelError::Spawn(e.to_string()))?;
        run_with_timeout(&mut child, timeout)
    }
}

fn run_with_timeout(child: &mut Child, timeout: Duration) -> Result<ExecResult> {
    let start = Instant::now();
    let poll_interval = Duration::from_millis(20);

    let status = loop {
        if let Some(status) = child.try_wait().map_err(KernelError::Io)? {
            break status;
        }
        if start.elapsed() >= timeout {
            kill_child(child);
            let _ = child.wait();
            return Ok(ExecResult {
                exit_code: -(nix::sys::signal::Signal::SIGTERM as i32),
                stdout: read_capped(child.stdout.take()),
                stderr: read_capped(child.stderr.take()),
                signal_name: Some("SIGTERM".to_string()),
                stdout_truncated: false,
                stderr_truncated: false,
            });
        }
        std::thread::sleep(poll_interval);
    };

    let (stdout, stdout_truncated) = read_capped_flag(child.stdout.take());
    let (stderr, stderr_truncated) = read_capped_flag(child.stderr.take());
    let exit_code = status.code().unwrap_or_else(|| {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            -status.signal().unwrap_or(0)
        }
        #[cfg(not(unix))]
        {
            -1
        }
    });
    let signal_name = signal::decode(exit_code);

    Ok(ExecResult { exit_code, stdout, stderr, signal_name, stdout_truncated, stderr_truncated })
}

/// Sends `SIGTERM` to the immediate child only. The workspace forbids
/// `unsafe_code`, which rules out a `pre_exec`-based `setsid` for
/// process-group kills — grandchildren survive a timeout.
fn kill_child(child: &Child) {
    let pid = nix::unistd::Pid::from_raw(child.id() as i32);
    let _ = nix::sys::signal::kill(pid, nix::sys::signal::Signal::SIGTERM);
}

fn read_capped(pipe: Option<impl Read>) -> String {
    read_capped_flag(pipe).0
}

fn read_capped_flag(pipe: Option<impl Read>) -> (String, bool) {
    let Some(mut pipe) = pipe else { return (String::new(), false) };
    let mut buf = Vec::with_capacity(4096);
    let mut limited = pipe.by_ref().take(DEFAULT_OUTPUT_CAP as u64 + 1);
    let _ = limited.read_to_end(&mut buf);
    let truncated = buf.len() > DEFAULT_OUTPUT_CAP;
    buf.truncate(DEFAULT_OUTPUT_CAP);
    (String::from_utf8_lossy(&buf).into_owned(), truncated)
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
