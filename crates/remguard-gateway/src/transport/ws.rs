//! WebSocket handler.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Resolve the caller from the `ticket` query parameter
//! - Lifecycle: ping/pong, idle timeout, kick signal, session cleanup
//! - Frame size is checked before parsing; call routing lives in
//!   [`call`](super::call)
//!
//! Every call to a `function` endpoint gets exactly one reply frame, also when
//! the call is rejected, the handler fails, or the handler panics.

use std::sync::Arc;

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, Query, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::{Duration, Instant};
use tracing::Instrument;

use remguard_core::error::Result;
use remguard_core::protocol::envelope::{error_json, kicked_json};

use crate::app_state::AppState;
use crate::context::CallerId;
use crate::session::Connection;
use crate::transport::call::handle_call;
use crate::transport::codec::{decode, frame_len, Inbound};

const OUTBOUND_QUEUE: usize = 1024;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub ticket: String,
}

pub async fn ws_upgrade(
    State(app): State<AppState>,
    ws: WebSocketUpgrade,
    Query(q): Query<WsQuery>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = run_session(app, q, socket).await {
            tracing::debug!(error = %e, "session ended with error");
        }
    })
}

async fn run_session(app: AppState, q: WsQuery, mut socket: WebSocket) -> Result<()> {
    let caller = match app.resolve_caller(&q.ticket) {
        Ok(c) => c,
        Err(e) => {
            let code = e.client_code().as_str();
            let _ = socket.send(Message::Text(error_json(code, "invalid ticket"))).await;
            return Err(e);
        }
    };

    let (out_tx, out_rx) = mpsc::channel::<String>(OUTBOUND_QUEUE);
    let (conn, kick_rx) = Connection::new(out_tx.clone());
    let seq = app.begin_session(&caller, conn);

    let span = tracing::info_span!("session", caller = %caller, seq);
    let result = session_loop(&app, &caller, socket, out_tx, out_rx, kick_rx)
        .instrument(span)
        .await;

    app.end_session(&caller, seq);
    result
}

async fn session_loop(
    app: &AppState,
    caller: &CallerId,
    socket: WebSocket,
    out_tx: mpsc::Sender<String>,
    mut out_rx: mpsc::Receiver<String>,
    mut kick_rx: tokio::sync::watch::Receiver<Option<String>>,
) -> Result<()> {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let gw = &app.cfg().gateway;
    let ping_every = Duration::from_millis(gw.ping_interval_ms);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);
    let inflight = Arc::new(Semaphore::new(gw.max_inflight_calls));

    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_activity = Instant::now();

    tracing::info!("session started");

    loop {
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv() => {
                let Some(text) = maybe_out else { break; };
                if ws_tx.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }

            // kick signal
            changed = kick_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let notice = kick_rx.borrow_and_update().clone();
                if let Some(msg) = notice {
                    tracing::info!(%msg, "caller kicked");
                    let _ = ws_tx.send(Message::Text(kicked_json(&msg))).await;
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(Ok(msg)) = incoming else { break; };
                last_activity = Instant::now();

                if frame_len(&msg) > gw.max_frame_bytes {
                    let _ = ws_tx.send(Message::Text(error_json("PAYLOAD_TOO_LARGE", "frame too large"))).await;
                    break;
                }

                match decode(msg) {
                    Ok(Inbound::Call { env, bytes_len }) => {
                        tracing::trace!(endpoint = %env.endpoint, bytes_len, "call frame");
                        handle_call(&app.dispatcher(), caller, env, &out_tx, &inflight);
                    }
                    Ok(Inbound::Ping(payload)) => {
                        let _ = ws_tx.send(Message::Pong(payload)).await;
                    }
                    Ok(Inbound::Pong(_)) => {}
                    Ok(Inbound::Close) => break,
                    Err(e) => {
                        app.metrics().decode_errors.inc(&[]);
                        let _ = out_tx.try_send(error_json(e.client_code().as_str(), &e.to_string()));
                    }
                }
            }

            // ping
            _ = ping_tick.tick() => {
                let _ = ws_tx.send(Message::Ping(Vec::new())).await;
            }

            // idle timeout
            _ = tokio::time::sleep(Duration::from_millis(250)) => {
                if last_activity.elapsed() >= idle_timeout {
                    let _ = ws_tx.send(Message::Text(error_json("TIMEOUT", "idle timeout"))).await;
                    break;
                }
            }
        }
    }

    tracing::info!("session closed");
    Ok(())
}
