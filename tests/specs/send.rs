// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `h2 send` specs that need no running daemon.

use crate::prelude::*;

#[test]
fn self_send_is_rejected_with_a_hint() {
    let world = World::new();
    let dir = world.mkdir("work");
    world.h2().args(&["init"]).cwd(&dir).passes();

    world
        .h2()
        .args(&["send", "alice", "hi"])
        .cwd(&dir)
        .env("H2_ACTOR", "alice")
        .fails_with(1)
        .stderr_has("cannot send a message to yourself (alice); use --allow-self to override");
}

#[test]
fn allow_self_bypasses_the_guard() {
    let world = World::new();
    let dir = world.mkdir("work");
    world.h2().args(&["init"]).cwd(&dir).passes();

    // The guard is bypassed; with no daemon the next failure is the
    // connection, reported as exit 3.
    world
        .h2()
        .args(&["send", "alice", "hi", "--allow-self"])
        .cwd(&dir)
        .env("H2_ACTOR", "alice")
        .fails_with(3)
        .stderr_has("cannot connect to agent alice");
}

#[test]
fn send_to_unknown_agent_suggests_alternatives() {
    let world = World::new();
    let dir = world.mkdir("work");
    world.h2().args(&["init"]).cwd(&dir).passes();

    // Fake another agent's socket so the suggestion list is non-empty.
    std::fs::write(dir.join("sockets/agent-bob.sock"), b"").unwrap();

    world
        .h2()
        .args(&["send", "ghost", "hello"])
        .cwd(&dir)
        .fails_with(3)
        .stderr_has("cannot connect to agent ghost")
        .stderr_has("available: bob");
}

#[test]
fn empty_body_is_a_user_error() {
    let world = World::new();
    let dir = world.mkdir("work");
    world.h2().args(&["init"]).cwd(&dir).passes();

    world
        .h2()
        .args(&["send", "alice"])
        .cwd(&dir)
        .fails_with(1)
        .stderr_has("message body is empty");
}

#[test]
fn bad_priority_is_rejected_by_clap() {
    let world = World::new();
    let dir = world.mkdir("work");
    world
        .h2()
        .args(&["send", "alice", "hi", "--priority", "urgent"])
        .cwd(&dir)
        .fails_with(2)
        .stderr_has("urgent");
}
