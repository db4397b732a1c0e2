// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end tests driving a real `tkd` process over its Unix-socket RPC
//! surface, one daemon per test in a scratch worktree. Covers the
//! deterministic scenarios; lease-timing and crash-simulation scenarios are
//! covered at the unit level in `tk-storage`'s `state_engine` tests instead
//! of here, where a sleep-based assertion would be flaky under load.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::json;
use tk_wire::{Request, Response};

struct TestDaemon {
    child: Child,
    socket: PathBuf,
    _dir: tempfile::TempDir,
}

impl TestDaemon {
    fn start() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let socket = dir.path().join("tk.sock");
        let child = Command::new(env!("CARGO_BIN_EXE_tkd"))
            .env("TK_WORKTREE", dir.path())
            .env("TK_SOCKET_PATH", &socket)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn tkd");

        let deadline = Instant::now() + Duration::from_secs(5);
        while !socket.exists() {
            assert!(Instant::now() < deadline, "daemon did not create its socket in time");
            std::thread::sleep(Duration::from_millis(20));
        }

        Self { child, socket, _dir: dir }
    }

    fn send(&self, request: &Request) -> Response {
        let stream = UnixStream::connect(&self.socket).expect("connect to daemon socket");
        let mut writer = stream.try_clone().expect("clone stream");
        let mut reader = BufReader::new(stream);

        let mut line = serde_json::to_string(request).expect("encode request");
        line.push('\n');
        writer.write_all(line.as_bytes()).expect("write request");
        writer.flush().expect("flush request");

        let mut raw = String::new();
        reader.read_line(&mut raw).expect("read response");
        serde_json::from_str(raw.trim_end()).expect("decode response")
    }

    fn ok_data(&self, request: &Request) -> serde_json::Value {
        match self.send(request) {
            Response::Ok { data } => data,
            Response::Error { message } => panic!("expected ok, got error: {message}"),
        }
    }

    fn expect_error(&self, request: &Request) -> String {
        match self.send(request) {
            Response::Error { message } => message,
            Response::Ok { data } => panic!("expected error, got ok: {data}"),
        }
    }

    fn shutdown(self) {
        let _ = self.send(&Request::Shutdown);
        let mut child = self.child;
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) if Instant::now() < deadline => std::thread::sleep(Duration::from_millis(20)),
                _ => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return;
                }
            }
        }
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

const LINEAR_PLAN: &str = "\
**Goal:** ship the feature

| Task Group | Tasks | Notes |
|---|---|---|
| Group 1 | 1 | |
| Group 2 | 2 | |
| Group 3 | 3 | |

### Task 1: setup
do setup

### Task 2: build
do build

### Task 3: ship
do ship
";

// Scenario 1: linear plan, single worker claims/completes straight through.
#[test]
fn linear_plan_single_worker_claims_through_to_completion() {
    let daemon = TestDaemon::start();

    let import = daemon.ok_data(&Request::PlanImport { content: LINEAR_PLAN.to_string() });
    assert_eq!(import["task_count"], json!(3));

    for expected_id in ["1", "2", "3"] {
        let claimed = daemon.ok_data(&Request::TaskClaim { worker_id: "w1".to_string() });
        assert_eq!(claimed["task_id"], json!(expected_id));
        assert_eq!(claimed["is_retry"], json!(false));
        assert_eq!(claimed["is_reclaim"], json!(false));

        let completed = daemon.ok_data(&Request::TaskComplete {
            task_id: expected_id.to_string(),
            worker_id: "w1".to_string(),
        });
        assert_eq!(completed["task_id"], json!(expected_id));
    }

    // Every task is COMPLETED now, so a further claim finds nothing.
    assert_eq!(daemon.send(&Request::TaskClaim { worker_id: "w1".to_string() }), Response::ok_null());

    daemon.shutdown();
}

// Scenario 5: a worker that never claimed a task cannot complete it, and the
// task stays RUNNING under its real owner.
#[test]
fn completion_by_a_non_owner_is_rejected_and_state_is_unchanged() {
    let daemon = TestDaemon::start();
    daemon.ok_data(&Request::PlanImport { content: LINEAR_PLAN.to_string() });

    let claimed = daemon.ok_data(&Request::TaskClaim { worker_id: "wA".to_string() });
    assert_eq!(claimed["task_id"], json!("1"));

    let message = daemon
        .expect_error(&Request::TaskComplete { task_id: "1".to_string(), worker_id: "wB".to_string() });
    assert!(message.contains("not claimed by wB"), "unexpected message: {message}");

    let tasks = daemon.ok_data(&Request::ListTasks);
    let task_one = tasks.as_array().unwrap().iter().find(|t| t["id"] == json!("1")).unwrap();
    assert_eq!(task_one["status"], json!("RUNNING"));
    assert_eq!(task_one["claimed_by"], json!("wA"));

    daemon.shutdown();
}

// Scenario 6: a misspelled heading (`### Task2` instead of `### Task 2`)
// leaves task "2" referenced by the group table but without a matching
// heading, surfacing as a phantom-task import error.
#[test]
fn markdown_import_with_a_misspelled_heading_is_rejected_as_a_phantom_task() {
    let daemon = TestDaemon::start();

    let doc = "\
**Goal:** phantom test

| Task Group | Tasks | Notes |
|---|---|---|
| Group 1 | 1, 2 | |

### Task 1: first
first body

### Task2: second
second body
";

    let message = daemon.expect_error(&Request::PlanImport { content: doc.to_string() });
    assert!(message.contains("phantom"), "unexpected message: {message}");
    assert!(message.contains("\"2\""), "unexpected message: {message}");

    // Rejected import must not have replaced the (still-empty) state.
    assert_eq!(daemon.send(&Request::GetState), Response::ok_null());

    daemon.shutdown();
}

// Scenario 9: a cyclic plan (expressed via the JSON fallback, since the
// Markdown grammar's group-N-depends-on-group-N-1 structure can't itself
// express a cycle) is rejected, and the prior state is left untouched.
#[test]
fn cyclic_plan_is_rejected_and_prior_state_is_preserved() {
    let daemon = TestDaemon::start();
    daemon.ok_data(&Request::PlanImport { content: LINEAR_PLAN.to_string() });

    let cyclic = "\
```json
{\"goal\": \"g\", \"tasks\": {\"a\": {\"description\": \"a\", \"dependencies\": [\"b\"]}, \"b\": {\"description\": \"b\", \"dependencies\": [\"a\"]}}}
```
";
    let message = daemon.expect_error(&Request::PlanImport { content: cyclic.to_string() });
    assert!(message.contains("cycle"), "unexpected message: {message}");

    let state = daemon.ok_data(&Request::GetState);
    assert_eq!(state["goal"], json!("ship the feature"));

    daemon.shutdown();
}

// Spec.md §6: ping reports the daemon as running alongside its own pid.
#[test]
fn ping_reports_the_daemon_pid() {
    let daemon = TestDaemon::start();
    let data = daemon.ok_data(&Request::Ping);
    assert_eq!(data["running"], json!(true));
    assert!(data["pid"].as_u64().is_some());
    daemon.shutdown();
}

// Spec.md §8 boundary: update_state rejects an unknown field outright
// rather than silently coercing or dropping it.
#[test]
fn update_state_rejects_an_unknown_field() {
    let daemon = TestDaemon::start();
    daemon.ok_data(&Request::PlanImport { content: LINEAR_PLAN.to_string() });

    let mut updates = serde_json::Map::new();
    updates.insert("not_a_real_field".to_string(), json!("nope"));
    let message = daemon.expect_error(&Request::UpdateState { updates });
    assert!(!message.is_empty());

    daemon.shutdown();
}
