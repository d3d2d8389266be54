// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent names.
//!
//! A name is unique within an h2 directory and doubles as the session
//! directory name and the socket name, so the character set is strict.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

pub const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("agent name is empty")]
    Empty,
    #[error("agent name too long ({0} > {MAX_NAME_LEN} chars)")]
    TooLong(usize),
    #[error("agent name must start with an alphanumeric character: {0:?}")]
    BadFirstChar(char),
    #[error("agent name contains invalid character {1:?}: {0:?}")]
    BadChar(String, char),
}

/// Validate `[A-Za-z0-9][A-Za-z0-9._-]{0,63}`.
pub fn validate_agent_name(name: &str) -> Result<(), NameError> {
    let mut chars = name.chars();
    let first = chars.next().ok_or(NameError::Empty)?;
    if name.len() > MAX_NAME_LEN {
        return Err(NameError::TooLong(name.len()));
    }
    if !first.is_ascii_alphanumeric() {
        return Err(NameError::BadFirstChar(first));
    }
    for c in chars {
        if !c.is_ascii_alphanumeric() && !matches!(c, '.' | '_' | '-') {
            return Err(NameError::BadChar(name.to_string(), c));
        }
    }
    Ok(())
}

/// A validated agent name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentName(String);

impl AgentName {
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        validate_agent_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for AgentName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AgentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for AgentName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
