// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `h2 show` - inspect one message.

use h2_wire::Request;

use crate::client::{active_dir, request_ok};
use crate::exit_error::ExitError;

pub async fn run(agent: &str, message_id: &str) -> Result<(), ExitError> {
    let dir = active_dir()?;
    let response =
        request_ok(&dir, agent, &Request::Show { message_id: message_id.to_string() }).await?;
    let Some(info) = response.message else {
        return Err(ExitError::system("daemon returned no message info"));
    };

    println!("Message: {}", info.id);
    println!("From: {}", info.from);
    println!("Priority: {}", info.priority);
    println!("Status: {}", info.status);
    if info.raw {
        println!("Raw: yes");
    }
    if let Some(reason) = &info.failure_reason {
        println!("Failure: {reason}");
    }
    println!("Body: {}", info.body);
    Ok(())
}
