// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entry point for `tkd`, the per-worktree task-execution daemon.

use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tk_daemon::handlers::AppState;
use tk_daemon::{env, lock, paths, server, socket, DaemonError};
use tk_storage::{StateEngine, TrajectoryLogger};

fn main() -> ExitCode {
    eprintln!("--- tkd: starting (pid: {}) ---\n", std::process::id());
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), DaemonError> {
    let worktree = paths::resolve_worktree()?;
    let log_dir = worktree.join(".claude");
    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::never(&log_dir, "daemon.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!(worktree = %worktree.display(), "starting tkd");

    let socket_paths = socket::resolve(&worktree)?;
    let instance_lock = lock::InstanceLock::acquire(&socket_paths.lock)?;
    tracing::info!(lock = %instance_lock.path().display(), "acquired instance lock");

    if socket_paths.socket.exists() {
        tracing::warn!(socket = %socket_paths.socket.display(), "removing stale socket from a prior run");
        std::fs::remove_file(&socket_paths.socket)?;
    }

    let runtime = tk_runtime::from_env().map_err(DaemonError::Runtime)?;

    let state_engine = StateEngine::new(paths::state_file(&worktree));
    let trajectory = TrajectoryLogger::new(paths::trajectory_file(&worktree));

    let shutdown_requested = Arc::new(AtomicBool::new(false));
    register_signal_handlers(&shutdown_requested);

    let app = Arc::new(AppState {
        state_engine,
        trajectory,
        runtime,
        exec_lock: tk_runtime::ExclusiveLock::new(),
        pid: std::process::id(),
        shutdown_requested: Arc::clone(&shutdown_requested),
    });

    let result = server::run(app, &socket_paths.socket, shutdown_requested, env::shutdown_drain_timeout());

    tracing::info!("tkd shutting down");
    drop(instance_lock);
    result.map_err(DaemonError::from)
}

/// SIGTERM/SIGINT both request the same ordered shutdown as the `shutdown`
/// RPC. `signal_hook::flag::register` is a safe wrapper around the
/// otherwise-`unsafe` `sigaction` call, which this workspace forbids
/// directly (`unsafe_code = "forbid"`).
fn register_signal_handlers(flag: &Arc<AtomicBool>) {
    for sig in [signal_hook::consts::SIGTERM, signal_hook::consts::SIGINT] {
        if let Err(e) = signal_hook::flag::register(sig, Arc::clone(flag)) {
            tracing::warn!(signal = sig, error = %e, "failed to install signal handler");
        }
    }
}
