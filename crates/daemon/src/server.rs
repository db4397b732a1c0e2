// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The accept loop (spec.md §4.7/§5): one OS thread per connection, no
//! event loop, no shared request queue. Shutdown is cooperative: the
//! accept loop polls a flag (set by a signal handler or the `shutdown`
//! RPC), stops taking new connections, waits a short bound for in-flight
//! handlers to finish, then tears down the socket.

use std::io::{BufReader, BufWriter};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tk_wire::{parse_request, read_line, write_response, Response};

use crate::handlers::{self, AppState};

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(20);

pub fn run(
    app: Arc<AppState>,
    socket_path: &Path,
    shutdown: Arc<AtomicBool>,
    drain_timeout: Duration,
) -> std::io::Result<()> {
    let listener = UnixListener::bind(socket_path)?;
    std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
    listener.set_nonblocking(true)?;

    let active_connections = Arc::new(AtomicUsize::new(0));

    while !shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, _addr)) => {
                let app = Arc::clone(&app);
                let active_connections = Arc::clone(&active_connections);
                active_connections.fetch_add(1, Ordering::SeqCst);
                thread::spawn(move || {
                    handle_connection(&app, stream);
                    active_connections.fetch_sub(1, Ordering::SeqCst);
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => {
                tracing::error!(error = %e, "accept failed");
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
        }
    }

    let deadline = Instant::now() + drain_timeout;
    while active_connections.load(Ordering::SeqCst) > 0 && Instant::now() < deadline {
        thread::sleep(DRAIN_POLL_INTERVAL);
    }

    drop(listener);
    let _ = std::fs::remove_file(socket_path);
    Ok(())
}

fn handle_connection(app: &AppState, stream: UnixStream) {
    let read_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(error = %e, "failed to clone connection for reading");
            return;
        }
    };
    let mut reader = BufReader::new(read_stream);
    let mut writer = BufWriter::new(stream);

    loop {
        let line = match read_line(&mut reader) {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                tracing::debug!(error = %e, "connection read error");
                return;
            }
        };

        let response = match parse_request(&line) {
            Ok(request) => handlers::dispatch(app, request),
            Err(e) => Response::error(e.to_string()),
        };

        if let Err(e) = write_response(&mut writer, &response) {
            tracing::debug!(error = %e, "failed to write response, dropping connection");
            return;
        }
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
