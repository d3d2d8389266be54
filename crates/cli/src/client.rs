// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket client for talking to one agent's supervisor.

use std::time::Duration;

use tokio::net::UnixStream;

use h2_storage::{resolve_dir, DiscoverError, H2Dir};
use h2_wire::{Request, Response, REQUEST_TIMEOUT};

use crate::exit_error::{ExitError, EXIT_CONNECT, EXIT_SYSTEM, EXIT_USER};

/// Resolve the active h2 directory, mapping discovery failures to user
/// errors.
pub fn active_dir() -> Result<H2Dir, ExitError> {
    resolve_dir().map_err(|e| match e {
        DiscoverError::NotFound | DiscoverError::BadOverride(_) => {
            ExitError::new(EXIT_USER, e.to_string())
        }
        other => ExitError::new(EXIT_SYSTEM, other.to_string()),
    })
}

/// Connect to an agent's control socket.
///
/// A refused or missing socket yields exit code 3 and a suggestion list
/// of the agents that do have sockets here.
pub async fn connect(dir: &H2Dir, agent: &str) -> Result<UnixStream, ExitError> {
    let socket = dir.agent_socket_path(agent);
    match UnixStream::connect(&socket).await {
        Ok(stream) => Ok(stream),
        Err(_) => {
            let available = dir.known_agents();
            let available = available
                .iter()
                .filter(|name| name.as_str() != agent)
                .cloned()
                .collect::<Vec<_>>();
            let suggestion = if available.is_empty() {
                "no agents are running".to_string()
            } else {
                format!("available: {}", available.join(", "))
            };
            Err(ExitError::new(
                EXIT_CONNECT,
                format!("cannot connect to agent {agent}; {suggestion}"),
            ))
        }
    }
}

/// One request, one response.
pub async fn request(dir: &H2Dir, agent: &str, request: &Request) -> Result<Response, ExitError> {
    let stream = connect(dir, agent).await?;
    let (mut reader, mut writer) = stream.into_split();
    h2_wire::write_request(&mut writer, request)
        .await
        .map_err(|e| ExitError::new(EXIT_SYSTEM, format!("failed to send request: {e}")))?;
    h2_wire::read_response(&mut reader, REQUEST_TIMEOUT)
        .await
        .map_err(|e| ExitError::new(EXIT_SYSTEM, format!("failed to read response: {e}")))
}

/// As [`request`], but an `ok: false` response becomes a user error.
pub async fn request_ok(dir: &H2Dir, agent: &str, req: &Request) -> Result<Response, ExitError> {
    let response = request(dir, agent, req).await?;
    if response.ok {
        Ok(response)
    } else {
        let message = response.error.unwrap_or_else(|| "request failed".to_string());
        Err(ExitError::new(EXIT_USER, message))
    }
}

/// Poll for the daemon socket to accept connections after a launch.
pub async fn wait_for_socket(dir: &H2Dir, agent: &str, budget: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + budget;
    loop {
        if UnixStream::connect(dir.agent_socket_path(agent)).await.is_ok() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
