// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `h2 init` - create an h2 directory and register its route.

use std::path::PathBuf;

use h2_storage::{init_dir, DiscoverError};

use crate::exit_error::ExitError;

pub fn run(path: Option<PathBuf>, prefix: Option<&str>) -> Result<(), ExitError> {
    let target = match path {
        Some(path) => path,
        None => std::env::current_dir()
            .map_err(|e| ExitError::system(format!("cannot determine current directory: {e}")))?,
    };
    std::fs::create_dir_all(&target)
        .map_err(|e| ExitError::system(format!("cannot create {}: {e}", target.display())))?;
    // The routes registry stores this path; it must outlive the CWD.
    let target = std::fs::canonicalize(&target)
        .map_err(|e| ExitError::system(format!("cannot resolve {}: {e}", target.display())))?;

    let home_root = dirs::home_dir()
        .map(|h| h.join(".h2"))
        .ok_or_else(|| ExitError::system("cannot determine home directory"))?;

    let outcome = init_dir(&target, prefix, &home_root).map_err(|e| match e {
        DiscoverError::AlreadyInitialised(_)
        | DiscoverError::PrefixTaken(_)
        | DiscoverError::RootPrefixReserved => ExitError::user(e.to_string()),
        other => ExitError::system(other.to_string()),
    })?;

    println!(
        "Initialised h2 directory at {} (prefix: {})",
        outcome.dir.root().display(),
        outcome.prefix
    );
    Ok(())
}
