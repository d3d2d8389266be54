// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for supervisor communication.
//!
//! Two layers on every connected Unix socket: a binary frame (1-byte kind
//! tag + 4-byte big-endian length + payload) and, for request/response
//! frames, a JSON envelope.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod frame;
mod request;
mod response;

pub use frame::{
    read_frame, read_frame_timeout, write_frame, Frame, FrameKind, ProtocolError, MAX_FRAME_SIZE,
};
pub use request::{decode_request, ControlMsg, Request, DETACH_BYTE};
pub use response::{AgentInfo, MessageInfo, Response};

use tokio::io::{AsyncRead, AsyncWrite};

/// Default soft timeout for per-request socket reads.
pub const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Read one request frame and decode its envelope.
pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Request, ProtocolError> {
    let frame = read_frame_timeout(reader, timeout).await?;
    if frame.kind != FrameKind::Request {
        return Err(ProtocolError::UnexpectedFrame(frame.kind));
    }
    decode_request(&frame.payload)
}

/// Encode a request into a request frame.
pub async fn write_request<W: AsyncWrite + Unpin>(
    writer: &mut W,
    request: &Request,
) -> Result<(), ProtocolError> {
    let payload = serde_json::to_vec(request)?;
    write_frame(writer, &Frame { kind: FrameKind::Request, payload }).await
}

/// Read one response frame and decode its envelope.
pub async fn read_response<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Response, ProtocolError> {
    let frame = read_frame_timeout(reader, timeout).await?;
    if frame.kind != FrameKind::Response {
        return Err(ProtocolError::UnexpectedFrame(frame.kind));
    }
    Ok(serde_json::from_slice(&frame.payload)?)
}

/// Encode a response into a response frame.
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
) -> Result<(), ProtocolError> {
    let payload = serde_json::to_vec(response)?;
    write_frame(writer, &Frame { kind: FrameKind::Response, payload }).await
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
