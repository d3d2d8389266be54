// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The control server: one Unix socket, typed requests.
//!
//! Each accepted connection is one request / one response, except
//! `attach`, which upgrades the connection into frame streaming and
//! hands it to the attach multiplexer. Handlers never mutate queue or
//! state directly beyond the `Shared` entry points; the scheduler stays
//! the single delivery worker.

use std::sync::Arc;
use std::time::Instant;

use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use h2_core::{format_elapsed, HookEvent, HookEventName, Message, MessageId};
use h2_storage::SessionMeta;
use h2_wire::{AgentInfo, ProtocolError, Request, Response};

use crate::attach::{self, AttachSet};
use crate::env;
use crate::pty::PtyHost;
use crate::shared::Shared;

/// Shared context for all request handlers.
pub struct ListenCtx {
    pub shared: Arc<Shared>,
    pub pty: Arc<PtyHost>,
    pub attaches: Arc<AttachSet>,
    pub meta: SessionMeta,
    pub start_time: Instant,
    /// Cancelled by a `stop` request; the lifecycle runs the shutdown.
    pub shutdown: CancellationToken,
}

pub struct Listener {
    listener: UnixListener,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub fn new(listener: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { listener, ctx }
    }

    /// Accept until `accept_cancel` fires. Excess connections beyond the
    /// handler cap queue in the listener backlog: the permit is taken
    /// before `accept`.
    pub async fn run(self, accept_cancel: CancellationToken) {
        let handlers = Arc::new(Semaphore::new(env::max_handlers()));
        loop {
            let permit = tokio::select! {
                _ = accept_cancel.cancelled() => break,
                permit = Arc::clone(&handlers).acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(_) => break,
                },
            };
            let stream = tokio::select! {
                _ = accept_cancel.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _)) => stream,
                    Err(e) => {
                        warn!(error = %e, "accept error");
                        continue;
                    }
                },
            };
            let ctx = Arc::clone(&self.ctx);
            tokio::spawn(async move {
                handle_connection(stream, &ctx).await;
                drop(permit);
            });
        }
        debug!("listener stopped");
    }
}

async fn handle_connection(stream: UnixStream, ctx: &ListenCtx) {
    let (mut reader, mut writer) = stream.into_split();

    let request = match h2_wire::read_request(&mut reader, env::request_timeout()).await {
        Ok(request) => request,
        Err(ProtocolError::UnknownRequestType(ty)) => {
            let resp = Response::err(format!("unknown request type: {ty}"));
            let _ = h2_wire::write_response(&mut writer, &resp).await;
            return;
        }
        Err(ProtocolError::Json(e)) => {
            let resp = Response::err(format!("invalid request: {e}"));
            let _ = h2_wire::write_response(&mut writer, &resp).await;
            return;
        }
        Err(e) => {
            debug!(error = %e, "dropping connection");
            return;
        }
    };

    debug!(request = ?request, "received request");

    // Attach upgrades the connection; everything else is one response.
    if let Request::Attach { cols, rows } = request {
        attach::run_attach(
            reader,
            writer,
            cols,
            rows,
            Arc::clone(&ctx.pty),
            Arc::clone(&ctx.attaches),
        )
        .await;
        return;
    }

    // Ack before initiating shutdown so the caller sees the response.
    if matches!(request, Request::Stop) {
        let _ = h2_wire::write_response(&mut writer, &Response::ok()).await;
        info!("stop requested");
        ctx.shutdown.cancel();
        return;
    }

    let response = handle_request(request, ctx);
    if let Err(e) = h2_wire::write_response(&mut writer, &response).await {
        debug!(error = %e, "failed to write response");
    }
}

fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Send { priority, from, body, raw } => {
            let mut message = Message::new(from, body, priority);
            message.raw = raw;
            match ctx.shared.enqueue(message) {
                Ok(id) => Response::with_message_id(id.to_string()),
                Err(e) => Response::err(format!("failed to persist message: {e}")),
            }
        }

        Request::Status => Response::with_agent(status_snapshot(ctx)),

        // Handled before dispatch (ack precedes shutdown).
        Request::Stop => Response::ok(),

        Request::HookEvent { event_name, tool_name, payload } => {
            let event =
                HookEvent { name: HookEventName::parse(&event_name), tool_name, payload };
            ctx.shared.apply_hook(&event);
            Response::ok()
        }

        Request::Show { message_id } => {
            let id = MessageId::from_string(&message_id);
            match ctx.shared.store.load(&id) {
                Ok(Some(message)) => Response::with_message((&message).into()),
                Ok(None) => Response::err(format!("unknown message id: {message_id}")),
                Err(e) => Response::err(format!("failed to load message: {e}")),
            }
        }

        // Handled before dispatch.
        Request::Attach { .. } => Response::err("attach must upgrade the connection"),
    }
}

fn status_snapshot(ctx: &ListenCtx) -> AgentInfo {
    let now = Instant::now();
    let tracker = ctx.shared.tracker.lock();
    let state = tracker.state().clone();
    let usage = tracker.usage();
    let last_tool = tracker.last_tool().map(str::to_string);
    let state_secs = tracker.time_in_state(now).as_secs();
    drop(tracker);

    let spec = &ctx.meta.spec;
    let mut command = spec.command.clone();
    for arg in &spec.args {
        command.push(' ');
        command.push_str(arg);
    }

    AgentInfo {
        name: spec.name.to_string(),
        command,
        role_name: spec.role_name.clone(),
        pod: spec.pod.clone(),
        state: state.as_str().to_string(),
        state_detail: format!("{} for {}", state.detail(), format_elapsed(state_secs)),
        state_secs,
        uptime_secs: now.saturating_duration_since(ctx.start_time).as_secs(),
        queued: ctx.shared.queued_count(),
        blocked: state.is_blocked(),
        blocked_tool: state.blocked_tool().map(str::to_string),
        session_id: ctx.meta.session_id.clone(),
        last_tool,
        tokens_in: usage.observed.then_some(usage.tokens_in),
        tokens_out: usage.observed.then_some(usage.tokens_out),
        cost_usd: usage.observed.then(|| usage.cost_usd),
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
