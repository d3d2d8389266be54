// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `h2 attach` - interactive attach to an agent's terminal.
//!
//! The connection upgrades into frame streaming after the handshake:
//! keystrokes go out as data frames, resizes as control frames, and PTY
//! output comes back as data frames. Ctrl+\ (0x1C) detaches locally
//! without disturbing the agent.

use crossterm::terminal;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::signal::unix::{signal, SignalKind};

use h2_wire::{read_frame, write_frame, ControlMsg, Frame, FrameKind, Request, DETACH_BYTE,
    REQUEST_TIMEOUT};

use crate::client::{active_dir, connect};
use crate::exit_error::{ExitError, EXIT_SYSTEM};

pub async fn run(agent: &str) -> Result<(), ExitError> {
    let dir = active_dir()?;
    let stream = connect(&dir, agent).await?;
    let (mut reader, mut writer) = stream.into_split();

    let (cols, rows) = terminal::size().unwrap_or((80, 24));
    h2_wire::write_request(&mut writer, &Request::Attach { cols, rows })
        .await
        .map_err(|e| ExitError::new(EXIT_SYSTEM, format!("attach failed: {e}")))?;
    let handshake = h2_wire::read_response(&mut reader, REQUEST_TIMEOUT)
        .await
        .map_err(|e| ExitError::new(EXIT_SYSTEM, format!("attach failed: {e}")))?;
    if !handshake.ok {
        let reason = handshake.error.unwrap_or_else(|| "attach refused".to_string());
        return Err(ExitError::new(EXIT_SYSTEM, reason));
    }

    eprintln!("Attached to {agent} (detach: Ctrl+\\)");
    terminal::enable_raw_mode()
        .map_err(|e| ExitError::new(EXIT_SYSTEM, format!("cannot enter raw mode: {e}")))?;
    let result = attach_loop(reader, writer).await;
    let _ = terminal::disable_raw_mode();
    eprintln!();
    eprintln!("Detached from {agent}");
    result
}

async fn attach_loop(reader: OwnedReadHalf, mut writer: OwnedWriteHalf) -> Result<(), ExitError> {
    // Socket → stdout runs as its own task so a slow terminal never
    // blocks the keystroke path.
    let mut output_task = tokio::spawn(pump_output(reader));

    let mut winch = signal(SignalKind::window_change())
        .map_err(|e| ExitError::new(EXIT_SYSTEM, format!("cannot watch SIGWINCH: {e}")))?;
    let mut stdin = tokio::io::stdin();
    let mut buf = [0u8; 4096];

    loop {
        tokio::select! {
            _ = &mut output_task => {
                // Daemon side closed (agent exited or supervisor stopped).
                return Ok(());
            }
            _ = winch.recv() => {
                if let Ok((cols, rows)) = terminal::size() {
                    let payload = serde_json::to_vec(&ControlMsg::Resize { cols, rows })
                        .unwrap_or_default();
                    let _ = write_frame(&mut writer, &Frame::control(payload)).await;
                }
            }
            read = stdin.read(&mut buf) => {
                let n = match read {
                    Ok(0) | Err(_) => {
                        output_task.abort();
                        return Ok(());
                    }
                    Ok(n) => n,
                };
                let chunk = &buf[..n];
                if let Some(i) = chunk.iter().position(|&b| b == DETACH_BYTE) {
                    // Forward what precedes the detach byte, then leave.
                    if i > 0 {
                        let _ = write_frame(&mut writer, &Frame::data(chunk[..i].to_vec())).await;
                    }
                    output_task.abort();
                    return Ok(());
                }
                if write_frame(&mut writer, &Frame::data(chunk.to_vec())).await.is_err() {
                    output_task.abort();
                    return Ok(());
                }
            }
        }
    }
}

async fn pump_output(mut reader: OwnedReadHalf) {
    let mut stdout = tokio::io::stdout();
    loop {
        match read_frame(&mut reader).await {
            Ok(frame) if frame.kind == FrameKind::Data => {
                if stdout.write_all(&frame.payload).await.is_err() {
                    break;
                }
                let _ = stdout.flush().await;
            }
            Ok(_) => {}
            Err(_) => break,
        }
    }
}
