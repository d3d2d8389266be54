// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    simple = { "alice" },
    digits = { "agent2" },
    leading_digit = { "2fast" },
    dots_dashes = { "build.bot-7_x" },
    single_char = { "a" },
)]
fn accepts_valid_names(name: &str) {
    assert!(validate_agent_name(name).is_ok(), "{name}");
}

#[yare::parameterized(
    empty = { "" },
    leading_dot = { ".hidden" },
    leading_dash = { "-flag" },
    slash = { "a/b" },
    space = { "a b" },
    unicode = { "agentë" },
)]
fn rejects_invalid_names(name: &str) {
    assert!(validate_agent_name(name).is_err(), "{name}");
}

#[test]
fn rejects_names_over_64_chars() {
    let name = "a".repeat(65);
    assert!(matches!(validate_agent_name(&name), Err(NameError::TooLong(65))));
    let name = "a".repeat(64);
    assert!(validate_agent_name(&name).is_ok());
}

#[test]
fn agent_name_parses_and_displays() {
    let name: AgentName = "worker-1".parse().unwrap();
    assert_eq!(name.to_string(), "worker-1");
    assert!("bad name".parse::<AgentName>().is_err());
}
