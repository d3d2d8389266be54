// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binary framing: 1-byte kind tag + 4-byte big-endian length + payload.
//!
//! An oversize length header is rejected before any of the body is read;
//! the caller is expected to drop the connection on any `ProtocolError`.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum frame payload (16 MiB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("unknown frame kind: {0:#04x}")]
    BadFrameKind(u8),

    #[error("unexpected {0:?} frame")]
    UnexpectedFrame(FrameKind),

    #[error("unknown request type: {0}")]
    UnknownRequestType(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timeout")]
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    Data = 0x01,
    Control = 0x02,
    Request = 0x03,
    Response = 0x04,
}

impl FrameKind {
    fn from_tag(tag: u8) -> Result<Self, ProtocolError> {
        match tag {
            0x01 => Ok(FrameKind::Data),
            0x02 => Ok(FrameKind::Control),
            0x03 => Ok(FrameKind::Request),
            0x04 => Ok(FrameKind::Response),
            other => Err(ProtocolError::BadFrameKind(other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn data(payload: impl Into<Vec<u8>>) -> Self {
        Self { kind: FrameKind::Data, payload: payload.into() }
    }

    pub fn control(payload: impl Into<Vec<u8>>) -> Self {
        Self { kind: FrameKind::Control, payload: payload.into() }
    }
}

/// Read one frame from an async reader.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Frame, ProtocolError> {
    let mut header = [0u8; 5];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed);
        }
        Err(e) => return Err(ProtocolError::Io(e)),
    }
    let kind = FrameKind::from_tag(header[0])?;
    let len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;

    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge { size: len, max: MAX_FRAME_SIZE });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Frame { kind, payload })
}

/// Read one frame, failing with `Timeout` if it does not arrive in time.
pub async fn read_frame_timeout<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Frame, ProtocolError> {
    tokio::time::timeout(timeout, read_frame(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

/// Write one frame to an async writer.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    frame: &Frame,
) -> Result<(), ProtocolError> {
    let len = frame.payload.len();
    if len > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge { size: len, max: MAX_FRAME_SIZE });
    }

    writer.write_all(&[frame.kind as u8]).await?;
    writer.write_all(&(len as u32).to_be_bytes()).await?;
    writer.write_all(&frame.payload).await?;
    writer.flush().await?;
    Ok(())
}
