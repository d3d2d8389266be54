// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `h2 send` - queue a message for an agent.

use h2_core::Priority;
use h2_wire::Request;

use crate::client::{active_dir, request_ok};
use crate::exit_error::ExitError;

pub async fn run(
    agent: &str,
    body: &str,
    priority: Priority,
    raw: bool,
    from: Option<String>,
    allow_self: bool,
) -> Result<(), ExitError> {
    if body.is_empty() {
        return Err(ExitError::user("message body is empty"));
    }

    let actor = std::env::var("H2_ACTOR").ok();
    let from = from.or_else(|| actor.clone()).unwrap_or_else(|| "user".to_string());

    if actor.as_deref() == Some(agent) && !allow_self {
        return Err(ExitError::user(format!(
            "cannot send a message to yourself ({agent}); use --allow-self to override"
        )));
    }

    let dir = active_dir()?;
    let response = request_ok(
        &dir,
        agent,
        &Request::Send { priority, from, body: body.to_string(), raw },
    )
    .await?;

    match response.message_id {
        Some(id) => println!("{id}"),
        None => println!("queued"),
    }
    Ok(())
}
