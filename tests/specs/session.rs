// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full supervisor sessions against a `cat` child.

use crate::prelude::*;
use std::time::{Duration, Instant};

fn wait_until(what: &str, mut check: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !check() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        std::thread::sleep(Duration::from_millis(50));
    }
}

#[test]
#[serial_test::serial]
fn run_send_show_status_stop() {
    let world = World::new();
    let dir = world.mkdir("work");
    world.h2().args(&["init"]).cwd(&dir).passes();

    world
        .h2()
        .args(&["run", "echoer", "--", "cat"])
        .cwd(&dir)
        .passes()
        .stdout_has("Started agent echoer");

    let socket = dir.join("sockets/agent-echoer.sock");
    assert!(socket.exists());
    assert!(dir.join("sessions/echoer/daemon.pid").exists());
    assert!(dir.join("sessions/echoer/session.metadata.json").exists());

    let id = world
        .h2()
        .args(&["send", "echoer", "hello", "there"])
        .cwd(&dir)
        .passes()
        .stdout()
        .trim()
        .to_string();
    assert!(!id.is_empty());

    // The message file exists immediately and is eventually delivered.
    let message_path = dir.join(format!("sessions/echoer/messages/{id}.json"));
    assert!(message_path.exists());
    wait_until("delivery", || {
        world
            .h2()
            .args(&["show", "echoer", &id])
            .cwd(&dir)
            .passes()
            .stdout()
            .contains("Status: delivered")
    });

    world
        .h2()
        .args(&["status", "echoer"])
        .cwd(&dir)
        .passes()
        .stdout_has("Agent: echoer")
        .stdout_has("Queued: 0");

    world.h2().args(&["list"]).cwd(&dir).passes().stdout_has("echoer");

    world.h2().args(&["stop", "echoer"]).cwd(&dir).passes().stdout_has("Stopping agent echoer");
    wait_until("socket cleanup", || !socket.exists());
    assert!(!dir.join("sessions/echoer/daemon.pid").exists());

    // Queued messages directory survives for post-mortem; the activity
    // log ends with a session summary.
    let activity =
        std::fs::read_to_string(dir.join("sessions/echoer/session-activity.jsonl")).unwrap();
    let last = activity.lines().last().unwrap();
    assert!(last.contains("session_summary"), "{last}");
}

#[test]
#[serial_test::serial]
fn hook_events_change_reported_state() {
    let world = World::new();
    let dir = world.mkdir("work");
    world.h2().args(&["init"]).cwd(&dir).passes();
    world.h2().args(&["run", "hooked", "--", "cat"]).cwd(&dir).passes();

    world
        .h2()
        .args(&["hook", "UserPromptSubmit", "--agent", "hooked"])
        .cwd(&dir)
        .passes();
    world
        .h2()
        .args(&["status", "hooked"])
        .cwd(&dir)
        .passes()
        .stdout_has("State: active");

    world
        .h2()
        .args(&["hook", "PermissionRequest", "--agent", "hooked", "--tool", "Bash"])
        .cwd(&dir)
        .passes();
    world
        .h2()
        .args(&["status", "hooked"])
        .cwd(&dir)
        .passes()
        .stdout_has("State: blocked-on-permission")
        .stdout_has("Blocked on: Bash");

    world.h2().args(&["stop", "hooked"]).cwd(&dir).passes();
}

#[test]
#[serial_test::serial]
fn duplicate_agent_name_fails_to_launch() {
    let world = World::new();
    let dir = world.mkdir("work");
    world.h2().args(&["init"]).cwd(&dir).passes();
    world.h2().args(&["run", "solo", "--", "cat"]).cwd(&dir).passes();

    world
        .h2()
        .args(&["run", "solo", "--", "cat"])
        .cwd(&dir)
        .fails_with(1)
        .stderr_has("already running");

    world.h2().args(&["stop", "solo"]).cwd(&dir).passes();
}

#[test]
fn invalid_agent_name_is_rejected_before_launch() {
    let world = World::new();
    let dir = world.mkdir("work");
    world.h2().args(&["init"]).cwd(&dir).passes();
    world
        .h2()
        .args(&["run", ".bad", "--", "cat"])
        .cwd(&dir)
        .fails_with(1)
        .stderr_has("invalid agent name");
}
