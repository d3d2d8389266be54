// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `h2 _daemon` - the supervisor entry point.
//!
//! Reached only via re-exec from `h2 run`, with stdio already redirected
//! into the session directory and the launch spec in the environment.

use std::path::Path;

use tracing_subscriber::EnvFilter;

use h2_core::LaunchSpec;
use h2_daemon::Supervisor;
use h2_storage::H2Dir;

use crate::commands::run::SPEC_ENV;
use crate::exit_error::ExitError;

pub async fn run(dir: &Path) -> Result<(), ExitError> {
    let spec_json = std::env::var(SPEC_ENV)
        .map_err(|_| ExitError::system(format!("{SPEC_ENV} is not set (use `h2 run`)")))?;
    let spec: LaunchSpec = serde_json::from_str(&spec_json)
        .map_err(|e| ExitError::system(format!("invalid launch spec: {e}")))?;

    // Stderr is the daemon log file; keep the writer non-blocking so a
    // slow disk never stalls the pumps.
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Supervisor::new(H2Dir::new(dir), spec)
        .run()
        .await
        .map_err(|e| ExitError::system(e.to_string()))
}
