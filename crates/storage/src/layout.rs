// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical layout of an h2 directory.
//!
//! ```text
//! .h2-dir.txt                 marker, contents = "v" + semver
//! roles/<name>.yaml
//! pods/roles/<name>.yaml
//! pods/templates/<name>.yaml
//! sessions/<name>/            owned by that agent's supervisor
//!   session.metadata.json
//!   session-activity.jsonl
//!   messages/<id>.json
//!   scrollback.log
//!   daemon.pid
//!   daemon.log
//! sockets/agent-<name>.sock
//! claude-config/<profile>/
//! routes.jsonl                root h2 dir only
//! worktrees/<name>/
//! ```

use std::path::{Path, PathBuf};

pub const MARKER_FILE: &str = ".h2-dir.txt";
pub const ROUTES_FILE: &str = "routes.jsonl";

/// Subdirectories created by `init`.
pub const SUBDIRS: [&str; 7] = [
    "roles",
    "sessions",
    "sockets",
    "worktrees",
    "pods/roles",
    "pods/templates",
    "claude-config/default",
];

/// A resolved h2 directory root. Purely path arithmetic; existence is
/// checked at resolution time, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct H2Dir(PathBuf);

impl H2Dir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self(root.into())
    }

    pub fn root(&self) -> &Path {
        &self.0
    }

    pub fn marker_path(&self) -> PathBuf {
        self.0.join(MARKER_FILE)
    }

    pub fn routes_path(&self) -> PathBuf {
        self.0.join(ROUTES_FILE)
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.0.join("sessions")
    }

    pub fn session_dir(&self, name: &str) -> PathBuf {
        self.sessions_dir().join(name)
    }

    pub fn metadata_path(&self, name: &str) -> PathBuf {
        self.session_dir(name).join("session.metadata.json")
    }

    pub fn activity_path(&self, name: &str) -> PathBuf {
        self.session_dir(name).join("session-activity.jsonl")
    }

    pub fn messages_dir(&self, name: &str) -> PathBuf {
        self.session_dir(name).join("messages")
    }

    pub fn scrollback_path(&self, name: &str) -> PathBuf {
        self.session_dir(name).join("scrollback.log")
    }

    pub fn pidfile_path(&self, name: &str) -> PathBuf {
        self.session_dir(name).join("daemon.pid")
    }

    pub fn daemon_log_path(&self, name: &str) -> PathBuf {
        self.session_dir(name).join("daemon.log")
    }

    pub fn sockets_dir(&self) -> PathBuf {
        self.0.join("sockets")
    }

    /// `sockets/<kind>-<name>.sock`, kind ∈ {agent, bridge}.
    pub fn socket_path(&self, kind: &str, name: &str) -> PathBuf {
        self.sockets_dir().join(format!("{kind}-{name}.sock"))
    }

    pub fn agent_socket_path(&self, name: &str) -> PathBuf {
        self.socket_path("agent", name)
    }

    pub fn roles_dir(&self) -> PathBuf {
        self.0.join("roles")
    }

    pub fn pod_roles_dir(&self) -> PathBuf {
        self.0.join("pods").join("roles")
    }

    pub fn claude_config_dir(&self, profile: &str) -> PathBuf {
        self.0.join("claude-config").join(profile)
    }

    pub fn worktrees_dir(&self) -> PathBuf {
        self.0.join("worktrees")
    }

    /// Agent names with a live control socket path on disk.
    pub fn known_agents(&self) -> Vec<String> {
        let mut names = Vec::new();
        let Ok(entries) = std::fs::read_dir(self.sockets_dir()) else {
            return names;
        };
        for entry in entries.flatten() {
            let file = entry.file_name();
            let Some(file) = file.to_str() else { continue };
            if let Some(stem) = file.strip_prefix("agent-").and_then(|s| s.strip_suffix(".sock")) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_compose() {
        let dir = H2Dir::new("/work/.h2");
        assert_eq!(dir.marker_path(), PathBuf::from("/work/.h2/.h2-dir.txt"));
        assert_eq!(
            dir.metadata_path("alice"),
            PathBuf::from("/work/.h2/sessions/alice/session.metadata.json")
        );
        assert_eq!(dir.messages_dir("alice"), PathBuf::from("/work/.h2/sessions/alice/messages"));
        assert_eq!(
            dir.agent_socket_path("alice"),
            PathBuf::from("/work/.h2/sockets/agent-alice.sock")
        );
        assert_eq!(
            dir.socket_path("bridge", "slack"),
            PathBuf::from("/work/.h2/sockets/bridge-slack.sock")
        );
    }

    #[test]
    fn known_agents_lists_sockets() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = H2Dir::new(tmp.path());
        std::fs::create_dir_all(dir.sockets_dir()).unwrap();
        std::fs::write(dir.sockets_dir().join("agent-bob.sock"), b"").unwrap();
        std::fs::write(dir.sockets_dir().join("agent-alice.sock"), b"").unwrap();
        std::fs::write(dir.sockets_dir().join("bridge-slack.sock"), b"").unwrap();
        assert_eq!(dir.known_agents(), vec!["alice".to_string(), "bob".to_string()]);
    }
}
