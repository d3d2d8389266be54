// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `h2 hook` - post a hook event to an agent's supervisor.
//!
//! Installed inside the child as its hook command; the child's own name
//! arrives via `H2_ACTOR`. Any JSON on stdin becomes the event payload.

use std::io::Read;

use h2_wire::Request;

use crate::client::{active_dir, request_ok};
use crate::exit_error::ExitError;

pub async fn run(
    event_name: &str,
    agent: Option<String>,
    tool: Option<String>,
) -> Result<(), ExitError> {
    let agent = agent
        .or_else(|| std::env::var("H2_ACTOR").ok())
        .ok_or_else(|| ExitError::user("no agent given and H2_ACTOR is not set"))?;

    let payload = read_stdin_payload();
    let tool_name = tool.or_else(|| {
        payload
            .as_ref()
            .and_then(|p| p.get("tool_name"))
            .and_then(|t| t.as_str())
            .map(str::to_string)
    });

    let dir = active_dir()?;
    request_ok(
        &dir,
        &agent,
        &Request::HookEvent { event_name: event_name.to_string(), tool_name, payload },
    )
    .await?;
    Ok(())
}

/// Read a JSON payload from stdin when it is piped in. A terminal stdin
/// or non-JSON input is ignored: hooks must never fail the child.
fn read_stdin_payload() -> Option<serde_json::Value> {
    use std::io::IsTerminal;
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return None;
    }
    let mut buf = String::new();
    stdin.lock().read_to_string(&mut buf).ok()?;
    if buf.trim().is_empty() {
        return None;
    }
    serde_json::from_str(&buf).ok()
}
