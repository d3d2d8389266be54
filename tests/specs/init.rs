// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `h2 init` specs: subtree creation, marker, routes registry.

use crate::prelude::*;

#[test]
fn init_creates_marker_and_subtree() {
    let world = World::new();
    let target = world.mkdir("proj");

    world
        .h2()
        .args(&["init"])
        .cwd(&target)
        .passes()
        .stdout_has("Initialised h2 directory")
        .stdout_has("prefix: proj");

    let marker = std::fs::read_to_string(target.join(".h2-dir.txt")).unwrap();
    assert!(marker.starts_with('v'));
    for sub in ["roles", "sessions", "sockets", "worktrees", "pods/roles", "claude-config/default"]
    {
        assert!(target.join(sub).is_dir(), "{sub}");
    }
}

#[test]
fn init_twice_fails_with_user_error() {
    let world = World::new();
    let target = world.mkdir("proj");

    world.h2().args(&["init"]).cwd(&target).passes();
    world
        .h2()
        .args(&["init"])
        .cwd(&target)
        .fails_with(1)
        .stderr_has("already an h2 directory");
}

#[test]
fn init_registers_routes_with_auto_incremented_prefixes() {
    let world = World::new();
    let a = world.mkdir("a/proj");
    let b = world.mkdir("b/proj");

    world.h2().args(&["init"]).cwd(&a).passes().stdout_has("prefix: proj");
    world.h2().args(&["init"]).cwd(&b).passes().stdout_has("prefix: proj-2");

    let routes = std::fs::read_to_string(world.home().join(".h2/routes.jsonl")).unwrap();
    let prefixes: Vec<String> = routes
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["prefix"]
            .as_str()
            .unwrap()
            .to_string())
        .collect();
    assert_eq!(prefixes, vec!["root", "proj", "proj-2"]);
}

#[test]
fn explicit_prefix_clash_is_rejected() {
    let world = World::new();
    let a = world.mkdir("a");
    let b = world.mkdir("b");

    world.h2().args(&["init", "--prefix", "work"]).cwd(&a).passes();
    world
        .h2()
        .args(&["init", "--prefix", "work"])
        .cwd(&b)
        .fails_with(1)
        .stderr_has("already taken");
}
