// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tk-storage: the State Engine (atomic claim/complete/fail/lease-renewal
//! over an atomically-replaced JSON file) and the Trajectory Logger
//! (append-only JSONL with reverse-seek tail reads).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod persist;
mod state_engine;
mod trajectory;

pub use persist::atomic_write_json;
pub use state_engine::{ClaimOutcome, StateEngine};
pub use trajectory::TrajectoryLogger;
