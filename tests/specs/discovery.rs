// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovery specs: marker walk-up, H2_DIR override, nesting.

use crate::prelude::*;

#[test]
fn list_walks_up_to_the_nearest_h2_directory() {
    let world = World::new();
    let outer = world.mkdir("outer");
    let deep = world.mkdir("outer/projects/x/deep");

    world.h2().args(&["init"]).cwd(&outer).passes();

    world
        .h2()
        .args(&["list"])
        .cwd(&deep)
        .passes()
        .stdout_has("No agents running in")
        .stdout_has("outer");
}

#[test]
fn nested_h2_directory_shadows_the_outer_one() {
    let world = World::new();
    let outer = world.mkdir("outer");
    let inner = world.mkdir("outer/inner");
    let below_inner = world.mkdir("outer/inner/projects");

    world.h2().args(&["init"]).cwd(&outer).passes();
    world.h2().args(&["init"]).cwd(&inner).passes();

    let stdout = world.h2().args(&["list"]).cwd(&below_inner).passes().stdout();
    assert!(stdout.contains("inner"), "{stdout}");
}

#[test]
fn h2_dir_env_overrides_the_walk_up() {
    let world = World::new();
    let a = world.mkdir("a");
    let b = world.mkdir("b");
    world.h2().args(&["init"]).cwd(&a).passes();
    world.h2().args(&["init"]).cwd(&b).passes();

    let stdout = world
        .h2()
        .args(&["list"])
        .cwd(&a)
        .env("H2_DIR", &b)
        .passes()
        .stdout();
    assert!(stdout.contains(&b.display().to_string()), "{stdout}");
}

#[test]
fn bad_h2_dir_override_is_an_error() {
    let world = World::new();
    let not_h2 = world.mkdir("plain");
    world
        .h2()
        .args(&["list"])
        .cwd(&not_h2)
        .env("H2_DIR", &not_h2)
        .fails_with(1)
        .stderr_has("not an h2 directory");
}

#[test]
fn no_h2_directory_anywhere_is_an_error() {
    let world = World::new();
    let nowhere = world.mkdir("nowhere");
    world
        .h2()
        .args(&["status", "ghost"])
        .cwd(&nowhere)
        .fails_with(1)
        .stderr_has("no h2 directory found");
}
