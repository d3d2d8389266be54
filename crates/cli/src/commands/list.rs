// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `h2 list` - agents of the active h2 directory.

use h2_wire::Request;

use crate::client::{active_dir, request};
use crate::exit_error::ExitError;

pub async fn run() -> Result<(), ExitError> {
    let dir = active_dir()?;
    let agents = dir.known_agents();
    if agents.is_empty() {
        println!("No agents running in {}", dir.root().display());
        return Ok(());
    }

    for name in agents {
        // Best effort per agent; a daemon that died mid-listing still shows up.
        let line = match request(&dir, &name, &Request::Status).await {
            Ok(resp) => match resp.agent {
                Some(info) => format!(
                    "{}  {}  queued:{}  {}",
                    info.name, info.state, info.queued, info.command
                ),
                None => format!("{name}  unknown"),
            },
            Err(_) => format!("{name}  unreachable"),
        };
        println!("{line}");
    }
    Ok(())
}
