// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decodes a negative exit code produced by a signal-terminated child into
//! its canonical POSIX name (spec.md §4.1).

use nix::sys::signal::Signal;

/// `rc >= 0` has no signal to report. For `rc < 0`, `n = -rc` is looked up
/// against the known signal table; an unrecognized number still gets a
/// label (`"SIG99"`) rather than being dropped.
pub fn decode(rc: i32) -> Option<String> {
    if rc >= 0 {
        return None;
    }
    let n = rc.unsigned_abs() as i32;
    match Signal::try_from(n) {
        Ok(signal) => Some(signal.as_str().to_string()),
        Err(_) => Some(format!("SIG{n}")),
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
