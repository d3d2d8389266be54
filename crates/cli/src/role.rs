// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Role files: `roles/<name>.yaml`, with pod-scoped overrides in
//! `pods/roles/<name>.yaml`. A role's only output into the supervisor is
//! the materialised `LaunchSpec`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use h2_core::{AgentName, HeartbeatConfig, LaunchSpec};
use h2_storage::H2Dir;

use crate::exit_error::ExitError;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleFile {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory; relative paths resolve against the h2 dir.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    /// Profile under `claude-config/` exported as CLAUDE_CONFIG_DIR.
    #[serde(default)]
    pub claude_config_profile: Option<String>,
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
    #[serde(default)]
    pub heartbeat: Option<HeartbeatConfig>,
}

/// Load a role, preferring the pod-scoped file when a pod is set.
pub fn load_role(dir: &H2Dir, role_name: &str, pod: Option<&str>) -> Result<RoleFile, ExitError> {
    let mut candidates = Vec::new();
    if pod.is_some() {
        candidates.push(dir.pod_roles_dir().join(format!("{role_name}.yaml")));
    }
    candidates.push(dir.roles_dir().join(format!("{role_name}.yaml")));

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                return serde_yaml::from_str(&content).map_err(|e| {
                    ExitError::user(format!("invalid role file {}: {e}", path.display()))
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(ExitError::system(format!(
                    "cannot read role file {}: {e}",
                    path.display()
                )))
            }
        }
    }

    let known = known_roles(dir);
    let hint = if known.is_empty() {
        "no roles defined".to_string()
    } else {
        format!("known roles: {}", known.join(", "))
    };
    Err(ExitError::user(format!("unknown role: {role_name} ({hint})")))
}

pub fn known_roles(dir: &H2Dir) -> Vec<String> {
    let mut out = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir.roles_dir()) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            if let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".yaml")) {
                out.push(stem.to_string());
            }
        }
    }
    out.sort();
    out
}

impl RoleFile {
    /// Materialise into the launch spec the supervisor consumes.
    pub fn into_spec(
        self,
        dir: &H2Dir,
        name: AgentName,
        role_name: &str,
        pod: Option<String>,
        invoke_cwd: PathBuf,
    ) -> LaunchSpec {
        let cwd = match self.cwd {
            Some(path) if path.is_absolute() => path,
            Some(path) => dir.root().join(path),
            None => invoke_cwd,
        };
        LaunchSpec {
            name,
            pod,
            role_name: role_name.to_string(),
            cwd,
            command: self.command,
            args: self.args,
            claude_config_dir: self
                .claude_config_profile
                .as_deref()
                .map(|profile| dir.claude_config_dir(profile)),
            overrides: self.overrides,
            heartbeat: self.heartbeat,
        }
    }
}

#[cfg(test)]
#[path = "role_tests.rs"]
mod tests;
