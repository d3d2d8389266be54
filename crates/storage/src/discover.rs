// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! h2 directory discovery and initialisation.
//!
//! Resolution order: the `H2_DIR` environment variable, the nearest
//! ancestor of the working directory carrying the marker file, then
//! `~/.h2` (auto-migrating a markerless `~/.h2` by writing the marker).
//! The marker's presence is the authoritative test; its contents are a
//! `v`-prefixed version string.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::layout::{H2Dir, MARKER_FILE, SUBDIRS};
use crate::routes::{append_route, derive_prefix, read_routes, RouteEntry, ROOT_PREFIX};
use crate::StoreError;

pub const H2_DIR_ENV: &str = "H2_DIR";

#[derive(Debug, Error)]
pub enum DiscoverError {
    #[error("H2_DIR is set to {0:?}, which is not an h2 directory")]
    BadOverride(PathBuf),

    #[error("no h2 directory found (run `h2 init`, or set H2_DIR)")]
    NotFound,

    #[error("{0} is already an h2 directory")]
    AlreadyInitialised(PathBuf),

    #[error("route prefix {0:?} is already taken")]
    PrefixTaken(String),

    #[error("route prefix {ROOT_PREFIX:?} is reserved for the home h2 directory")]
    RootPrefixReserved,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Whether `path` is an h2 directory: the marker exists and starts with `v`.
pub fn is_h2_dir(path: &Path) -> bool {
    match std::fs::read_to_string(path.join(MARKER_FILE)) {
        Ok(contents) => contents.starts_with('v'),
        Err(_) => false,
    }
}

/// Resolve the active h2 directory from the real environment.
pub fn resolve_dir() -> Result<H2Dir, DiscoverError> {
    let env_override = std::env::var_os(H2_DIR_ENV).map(PathBuf::from);
    let cwd = std::env::current_dir().map_err(|_| DiscoverError::NotFound)?;
    resolve_dir_in(env_override.as_deref(), &cwd, dirs::home_dir().as_deref())
}

/// Resolution core, parameterised for tests.
pub fn resolve_dir_in(
    env_override: Option<&Path>,
    cwd: &Path,
    home: Option<&Path>,
) -> Result<H2Dir, DiscoverError> {
    if let Some(dir) = env_override {
        if is_h2_dir(dir) {
            return Ok(H2Dir::new(dir));
        }
        return Err(DiscoverError::BadOverride(dir.to_path_buf()));
    }

    let mut cursor = Some(cwd);
    while let Some(dir) = cursor {
        if is_h2_dir(dir) {
            return Ok(H2Dir::new(dir));
        }
        cursor = dir.parent();
    }

    if let Some(home) = home {
        let fallback = home.join(".h2");
        if fallback.is_dir() {
            // Pre-marker directories are migrated in place.
            if !is_h2_dir(&fallback) {
                write_marker(&fallback)?;
            }
            return Ok(H2Dir::new(fallback));
        }
    }

    Err(DiscoverError::NotFound)
}

/// Every known h2 directory: the resolved one (when resolvable) plus all
/// routes-registry entries whose target still carries a marker.
pub fn resolve_dir_all() -> Vec<H2Dir> {
    let resolved = resolve_dir().ok();
    let home_root = dirs::home_dir().map(|h| h.join(".h2"));
    resolve_dir_all_in(resolved, home_root.as_deref())
}

pub fn resolve_dir_all_in(resolved: Option<H2Dir>, home_root: Option<&Path>) -> Vec<H2Dir> {
    let mut out: Vec<H2Dir> = Vec::new();
    let mut push = |dir: H2Dir| {
        if !out.contains(&dir) {
            out.push(dir);
        }
    };

    if let Some(dir) = resolved {
        push(dir);
    }
    if let Some(root) = home_root {
        for route in read_routes(&root.join("routes.jsonl")) {
            if is_h2_dir(&route.path) {
                push(H2Dir::new(route.path));
            }
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitOutcome {
    pub dir: H2Dir,
    pub prefix: String,
}

/// Initialise `path` as an h2 directory and register it in the routes
/// registry under `home_root` (the home h2 directory, created on demand).
///
/// The subtree is created first and the marker written last, so a partial
/// init never passes `is_h2_dir`. Refuses directories that already carry
/// a marker.
pub fn init_dir(
    path: &Path,
    explicit_prefix: Option<&str>,
    home_root: &Path,
) -> Result<InitOutcome, DiscoverError> {
    if is_h2_dir(path) {
        return Err(DiscoverError::AlreadyInitialised(path.to_path_buf()));
    }

    let is_root = path == home_root;
    if !is_root {
        ensure_root(home_root)?;
    }

    create_subtree(path)?;
    write_marker(path)?;

    let routes_path = home_root.join("routes.jsonl");
    let existing = read_routes(&routes_path);
    let prefix = match explicit_prefix {
        Some(p) if p == ROOT_PREFIX && !is_root => {
            return Err(DiscoverError::RootPrefixReserved);
        }
        Some(p) => {
            if existing.iter().any(|r| r.prefix == p) {
                return Err(DiscoverError::PrefixTaken(p.to_string()));
            }
            p.to_string()
        }
        None if is_root => ROOT_PREFIX.to_string(),
        None => {
            let basename = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("h2")
                .to_string();
            derive_prefix(&existing, &basename)
        }
    };

    append_route(&routes_path, &RouteEntry { prefix: prefix.clone(), path: path.to_path_buf() })?;
    Ok(InitOutcome { dir: H2Dir::new(path), prefix })
}

/// Create the home h2 directory (with its `root` route) if missing.
fn ensure_root(home_root: &Path) -> Result<(), DiscoverError> {
    if is_h2_dir(home_root) {
        return Ok(());
    }
    create_subtree(home_root)?;
    write_marker(home_root)?;
    let routes_path = home_root.join("routes.jsonl");
    let existing = read_routes(&routes_path);
    if !existing.iter().any(|r| r.prefix == ROOT_PREFIX) {
        append_route(
            &routes_path,
            &RouteEntry { prefix: ROOT_PREFIX.to_string(), path: home_root.to_path_buf() },
        )?;
    }
    Ok(())
}

fn create_subtree(path: &Path) -> Result<(), StoreError> {
    for sub in SUBDIRS {
        let dir = path.join(sub);
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::io(dir, e))?;
    }
    Ok(())
}

fn write_marker(path: &Path) -> Result<(), StoreError> {
    let marker = path.join(MARKER_FILE);
    let contents = format!("v{}\n", env!("CARGO_PKG_VERSION"));
    std::fs::write(&marker, contents).map_err(|e| StoreError::io(marker, e))
}

#[cfg(test)]
#[path = "discover_tests.rs"]
mod tests;
