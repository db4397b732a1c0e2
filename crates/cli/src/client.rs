// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous client for the daemon's newline-delimited JSON RPC socket
//! (spec.md §6). No async runtime here: one command in, one response out,
//! then the CLI process exits.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;

use tk_wire::{read_line, Request, Response};

use crate::daemon_process;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("daemon is not running")]
    NotRunning,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed response from daemon: {0}")]
    Protocol(#[from] tk_wire::ProtocolError),
    #[error("failed to start daemon: {0}")]
    SpawnFailed(String),
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_not_running(&self) -> bool {
        matches!(self, ClientError::NotRunning)
    }
}

pub struct DaemonClient {
    stream: BufReader<UnixStream>,
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to an already-running daemon. Does not spawn one.
    pub fn connect(socket_path: &std::path::Path) -> Result<Self, ClientError> {
        let stream = UnixStream::connect(socket_path).map_err(|_| ClientError::NotRunning)?;
        stream.set_read_timeout(Some(Duration::from_secs(30)))?;
        stream.set_write_timeout(Some(Duration::from_secs(30)))?;
        Ok(Self { stream: BufReader::new(stream), socket_path: socket_path.to_path_buf() })
    }

    /// Connect, spawning a background daemon first if the socket is dead.
    pub fn connect_or_spawn(
        socket_path: &std::path::Path,
        worktree: &std::path::Path,
    ) -> Result<Self, ClientError> {
        if let Ok(client) = Self::connect(socket_path) {
            return Ok(client);
        }
        daemon_process::spawn_background(worktree)?;
        daemon_process::wait_for_socket(socket_path, Duration::from_secs(5))?;
        Self::connect(socket_path)
    }

    pub fn send(&mut self, request: &Request) -> Result<Response, ClientError> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        let inner = self.stream.get_mut();
        inner.write_all(line.as_bytes())?;
        inner.flush()?;

        match read_line(&mut self.stream)? {
            Some(raw) => {
                let response: Response = serde_json::from_str(&raw)
                    .map_err(tk_wire::ProtocolError::Json)?;
                Ok(response)
            }
            None => Err(ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "daemon closed the connection without responding",
            ))),
        }
    }

    pub fn socket_path(&self) -> &std::path::Path {
        &self.socket_path
    }
}

/// Read one line from a plain `BufRead`, used by tests that feed a fixture
/// reader instead of a live socket.
#[cfg(test)]
pub(crate) fn read_response(reader: &mut impl BufRead) -> Result<Response, ClientError> {
    match read_line(reader)? {
        Some(raw) => Ok(serde_json::from_str(&raw).map_err(tk_wire::ProtocolError::Json)?),
        None => Err(ClientError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "unexpected eof",
        ))),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
