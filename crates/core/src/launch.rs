// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch-time configuration for a supervised agent.
//!
//! The front end materialises a role into a `LaunchSpec`; the supervisor
//! consumes nothing else. Agent kinds (claude, a plain command, `true` in
//! tests) differ only in which command and args end up here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::agent::AgentName;

/// Idle-nudge configuration carried by a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Seconds of uninterrupted idle before the nudge fires.
    pub idle_timeout_secs: u64,
    /// Body of the injected message.
    pub message: String,
    /// Optional `sh -c` command; non-zero exit suppresses the nudge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl HeartbeatConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Everything the supervisor needs to start one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchSpec {
    pub name: AgentName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
    pub role_name: String,
    pub cwd: PathBuf,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_config_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<HeartbeatConfig>,
}

impl LaunchSpec {
    /// Minimal spec for an arbitrary command; used by tests and `h2 run -- cmd`.
    pub fn command(name: AgentName, cwd: PathBuf, command: impl Into<String>) -> Self {
        Self {
            name,
            pod: None,
            role_name: "command".to_string(),
            cwd,
            command: command.into(),
            args: Vec::new(),
            claude_config_dir: None,
            overrides: BTreeMap::new(),
            heartbeat: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_round_trips() {
        let name: AgentName = "alice".parse().unwrap();
        let mut spec = LaunchSpec::command(name, PathBuf::from("/tmp"), "cat");
        spec.pod = Some("team".to_string());
        spec.heartbeat = Some(HeartbeatConfig {
            idle_timeout_secs: 300,
            message: "still there?".to_string(),
            condition: None,
        });
        let json = serde_json::to_string(&spec).unwrap();
        let back: LaunchSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
        assert_eq!(back.heartbeat.unwrap().idle_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn empty_collections_are_omitted() {
        let name: AgentName = "a".parse().unwrap();
        let spec = LaunchSpec::command(name, PathBuf::from("/"), "true");
        let json = serde_json::to_value(&spec).unwrap();
        assert!(json.get("overrides").is_none());
        assert!(json.get("heartbeat").is_none());
        assert!(json.get("pod").is_none());
    }
}
