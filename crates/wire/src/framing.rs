// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newline-delimited JSON framing over a blocking stream (spec.md §6).
//!
//! One request per line in, one response per line out. Line length is not
//! bounded — callers reading untrusted input should still cap it with
//! `std::io::Read::take` upstream if that ever becomes a concern; the
//! daemon's own clients are trusted (filesystem-permission-scoped socket).

use std::io::{self, BufRead, Write};

use crate::{Response, ProtocolError};

/// Read one line, stripping the trailing `\n`/`\r\n`. Returns `Ok(None)` on
/// clean EOF (client disconnected without sending a final newline).
pub fn read_line(reader: &mut impl BufRead) -> Result<Option<String>, ProtocolError> {
    let mut buf = String::new();
    let n = reader.read_line(&mut buf).map_err(ProtocolError::Io)?;
    if n == 0 {
        return Ok(None);
    }
    while buf.ends_with('\n') || buf.ends_with('\r') {
        buf.pop();
    }
    Ok(Some(buf))
}

/// Write one response as a single JSON line, flushing immediately so the
/// client sees it without waiting on buffering.
pub fn write_response(writer: &mut impl Write, response: &Response) -> io::Result<()> {
    let mut line =
        serde_json::to_string(response).unwrap_or_else(|_| r#"{"status":"error","message":"internal: failed to encode response"}"#.to_string());
    line.push('\n');
    writer.write_all(line.as_bytes())?;
    writer.flush()
}

#[cfg(test)]
#[path = "framing_tests.rs"]
mod tests;
