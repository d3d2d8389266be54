// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `h2 stop` - graceful shutdown of an agent's supervisor.

use h2_wire::Request;

use crate::client::{active_dir, request_ok};
use crate::exit_error::ExitError;

pub async fn run(agent: &str) -> Result<(), ExitError> {
    let dir = active_dir()?;
    request_ok(&dir, agent, &Request::Stop).await?;
    println!("Stopping agent {agent}");
    Ok(())
}
