// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `h2 run` - launch a supervised agent.
//!
//! The heavy lifting happens in the daemon: this command materialises
//! the launch spec, re-execs the current binary with the hidden
//! `_daemon` subcommand (stdio redirected into the session directory),
//! and waits for the control socket to appear.

use std::process::Stdio;
use std::time::Duration;

use h2_core::{AgentName, LaunchSpec};
use h2_storage::H2Dir;

use crate::client::{active_dir, wait_for_socket};
use crate::exit_error::ExitError;
use crate::role::load_role;

/// Environment variable carrying the launch spec into `_daemon`.
pub const SPEC_ENV: &str = "H2_LAUNCH_SPEC";

pub async fn run(
    name: &str,
    role: &str,
    pod: Option<String>,
    command: Vec<String>,
) -> Result<(), ExitError> {
    let name: AgentName = name
        .parse()
        .map_err(|e| ExitError::user(format!("invalid agent name: {e}")))?;
    let dir = active_dir()?;
    if tokio::net::UnixStream::connect(dir.agent_socket_path(name.as_str())).await.is_ok() {
        return Err(ExitError::user(format!("agent {name} is already running")));
    }
    let cwd = std::env::current_dir()
        .map_err(|e| ExitError::system(format!("cannot determine current directory: {e}")))?;

    let spec = if command.is_empty() {
        let role_file = load_role(&dir, role, pod.as_deref())?;
        role_file.into_spec(&dir, name, role, pod, cwd)
    } else {
        let mut spec = LaunchSpec::command(name, cwd, command[0].clone());
        spec.args = command[1..].to_vec();
        spec.pod = pod;
        spec
    };

    spawn_daemon(&dir, &spec)?;

    if wait_for_socket(&dir, spec.name.as_str(), Duration::from_secs(5)).await {
        println!("Started agent {} ({})", spec.name, spec.command);
        Ok(())
    } else {
        Err(ExitError::system(format!(
            "daemon for {} did not come up; see {}",
            spec.name,
            dir.daemon_log_path(spec.name.as_str()).display()
        )))
    }
}

fn spawn_daemon(dir: &H2Dir, spec: &LaunchSpec) -> Result<(), ExitError> {
    let name = spec.name.as_str();
    let session_dir = dir.session_dir(name);
    std::fs::create_dir_all(&session_dir)
        .map_err(|e| ExitError::system(format!("cannot create session directory: {e}")))?;

    let exe = std::env::current_exe()
        .map_err(|e| ExitError::system(format!("cannot locate own binary: {e}")))?;
    let spec_json = serde_json::to_string(spec)
        .map_err(|e| ExitError::system(format!("cannot encode launch spec: {e}")))?;

    let log = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.daemon_log_path(name))
        .map_err(|e| ExitError::system(format!("cannot open daemon log: {e}")))?;
    let log_err = log
        .try_clone()
        .map_err(|e| ExitError::system(format!("cannot open daemon log: {e}")))?;

    std::process::Command::new(exe)
        .arg("_daemon")
        .arg("--dir")
        .arg(dir.root())
        .env(SPEC_ENV, spec_json)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err))
        .spawn()
        .map_err(|e| ExitError::system(format!("cannot spawn daemon: {e}")))?;

    Ok(())
}
