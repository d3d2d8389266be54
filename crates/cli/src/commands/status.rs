// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `h2 status` - one agent's status snapshot.

use h2_core::format_elapsed;
use h2_wire::Request;

use crate::client::{active_dir, request_ok};
use crate::exit_error::ExitError;

pub async fn run(agent: &str) -> Result<(), ExitError> {
    let dir = active_dir()?;
    let response = request_ok(&dir, agent, &Request::Status).await?;
    let Some(info) = response.agent else {
        return Err(ExitError::system("daemon returned no agent info"));
    };

    println!("Agent: {}", info.name);
    println!("Command: {}", info.command);
    println!("Role: {}", info.role_name);
    if let Some(pod) = &info.pod {
        println!("Pod: {pod}");
    }
    println!("State: {} ({})", info.state, info.state_detail);
    if info.blocked {
        match &info.blocked_tool {
            Some(tool) => println!("Blocked on: {tool}"),
            None => println!("Blocked on: permission"),
        }
    }
    println!("Uptime: {}", format_elapsed(info.uptime_secs));
    println!("Queued: {}", info.queued);
    if let Some(tool) = &info.last_tool {
        println!("Last tool: {tool}");
    }
    if let (Some(tin), Some(tout)) = (info.tokens_in, info.tokens_out) {
        println!("Tokens: {tin} in / {tout} out");
    }
    if let Some(cost) = info.cost_usd {
        println!("Cost: ${cost:.2}");
    }
    println!("Session: {}", info.session_id);
    Ok(())
}
