// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request envelope and control-frame payloads.

use serde::{Deserialize, Serialize};

use h2_core::Priority;

use crate::frame::ProtocolError;

/// Byte an attach client treats as "detach" (Ctrl+\). Intercepted client
/// side; the supervisor forwards data frames to the PTY unfiltered.
pub const DETACH_BYTE: u8 = 0x1c;

/// Typed requests accepted on the control socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Send {
        #[serde(default)]
        priority: Priority,
        from: String,
        body: String,
        #[serde(default)]
        raw: bool,
    },
    /// Connection-upgrading: after the handshake response the socket
    /// switches to data/control frame streaming.
    Attach { cols: u16, rows: u16 },
    Status,
    Stop,
    HookEvent {
        event_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<serde_json::Value>,
    },
    Show { message_id: String },
}

/// Decode a request payload.
///
/// A well-formed JSON object with an unrecognised `type` becomes
/// `UnknownRequestType` so the server can answer
/// `{ok:false, error:"unknown request type: …"}` instead of a generic
/// parse failure.
pub fn decode_request(payload: &[u8]) -> Result<Request, ProtocolError> {
    match serde_json::from_slice::<Request>(payload) {
        Ok(req) => Ok(req),
        Err(err) => {
            if let Ok(value) = serde_json::from_slice::<serde_json::Value>(payload) {
                if let Some(ty) = value.get("type").and_then(|t| t.as_str()) {
                    const KNOWN: [&str; 6] =
                        ["send", "attach", "status", "stop", "hook_event", "show"];
                    if !KNOWN.contains(&ty) {
                        return Err(ProtocolError::UnknownRequestType(ty.to_string()));
                    }
                }
            }
            Err(ProtocolError::Json(err))
        }
    }
}

/// Control-frame payloads exchanged on an attached connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMsg {
    Resize { cols: u16, rows: u16 },
}
