// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message identifiers.
//!
//! Message ids are 26-character lowercase Crockford base32 strings: a
//! 48-bit millisecond timestamp (10 chars) followed by 80 random bits
//! (16 chars). Lexicographic order over ids equals creation order, so a
//! sorted directory scan replays messages in the order they were sent.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

const ALPHABET: &[u8; 32] = b"0123456789abcdefghjkmnpqrstvwxyz";

/// Total id length: 10 timestamp chars + 16 random chars.
pub const MESSAGE_ID_LEN: usize = 26;

/// Returns a string slice truncated to at most `n` characters.
pub fn short(s: &str, n: usize) -> &str {
    if s.len() <= n {
        s
    } else {
        &s[..n]
    }
}

/// Sortable identifier for a queued message.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Mint a fresh id stamped with the current wall clock.
    pub fn new() -> Self {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self::from_parts(ms, uuid::Uuid::new_v4().as_bytes())
    }

    /// Mint an id for a specific timestamp. Entropy still comes from the
    /// random tail, so ids minted in the same millisecond stay distinct.
    pub fn at(epoch_ms: u64) -> Self {
        Self::from_parts(epoch_ms, uuid::Uuid::new_v4().as_bytes())
    }

    fn from_parts(epoch_ms: u64, entropy: &[u8; 16]) -> Self {
        let mut out = String::with_capacity(MESSAGE_ID_LEN);
        // 48-bit timestamp, most significant 5-bit group first.
        for shift in (0..10).rev() {
            let idx = ((epoch_ms >> (shift * 5)) & 0x1f) as usize;
            out.push(ALPHABET[idx] as char);
        }
        // 80 random bits from the first 10 entropy bytes.
        let mut acc: u32 = 0;
        let mut bits = 0;
        for &byte in &entropy[..10] {
            acc = (acc << 8) | u32::from(byte);
            bits += 8;
            while bits >= 5 {
                bits -= 5;
                out.push(ALPHABET[((acc >> bits) & 0x1f) as usize] as char);
            }
        }
        Self(out)
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Millisecond timestamp recovered from the id prefix, or `None` if
    /// the prefix is not valid base32.
    pub fn epoch_ms(&self) -> Option<u64> {
        let prefix = self.0.as_bytes().get(..10)?;
        let mut ms: u64 = 0;
        for &c in prefix {
            let v = ALPHABET.iter().position(|&a| a == c)? as u64;
            ms = (ms << 5) | v;
        }
        Some(ms)
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for MessageId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MessageId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for MessageId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
