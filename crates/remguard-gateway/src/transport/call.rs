//! Call handling for the reference transport, independent of the socket.
//!
//! Frames go to the session's outbound queue. Replies that carry a call id
//! are always delivered with a waiting send, so a full queue delays them
//! but never drops them. Id-less notices are best-effort.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};

use remguard_core::error::ClientCode;
use remguard_core::protocol::envelope::{
    error_json, reply_failed_json, reply_ok_json, reply_rejected_json, CallEnvelope,
};

use crate::context::CallerId;
use crate::dispatch::{Dispatcher, Endpoint, EndpointKind, Reply};

/// Reply code when a session has too many calls in flight.
pub const BUSY: &str = "BUSY";

/// Route one call. Only lookups and the in-flight check happen inline;
/// argument decoding and the guarded call run on their own task.
pub fn handle_call(
    dispatcher: &Dispatcher,
    caller: &CallerId,
    env: CallEnvelope,
    out_tx: &mpsc::Sender<String>,
    inflight: &Arc<Semaphore>,
) {
    let Some(endpoint) = dispatcher.endpoint(&env.endpoint) else {
        dispatcher.metrics().unknown_endpoint.inc(&[]);
        fail(out_tx, env.id, ClientCode::UnknownEndpoint.as_str(), "unknown endpoint");
        return;
    };

    let id = match (endpoint.kind(), env.id) {
        (EndpointKind::Function, None) => {
            fail(out_tx, None, ClientCode::BadRequest.as_str(), "function calls require an id");
            return;
        }
        (EndpointKind::Function, Some(id)) => Some(id),
        (EndpointKind::Event, _) => None,
    };

    let Ok(permit) = Arc::clone(inflight).try_acquire_owned() else {
        fail(out_tx, id, BUSY, "too many calls in flight");
        return;
    };

    tokio::spawn(run_call(
        endpoint,
        caller.clone(),
        env,
        id,
        out_tx.clone(),
        permit,
    ));
}

async fn run_call(
    endpoint: Arc<Endpoint>,
    caller: CallerId,
    env: CallEnvelope,
    id: Option<u64>,
    out_tx: mpsc::Sender<String>,
    _permit: OwnedSemaphorePermit,
) {
    let args = match env.decode_args() {
        Ok(args) => args,
        Err(e) => {
            endpoint.metrics().decode_errors.inc(&[]);
            let code = e.client_code().as_str();
            let frame = match id {
                Some(id) => reply_failed_json(id, code),
                None => error_json(code, &e.to_string()),
            };
            let _ = out_tx.send(frame).await;
            return;
        }
    };

    let reply = AssertUnwindSafe(endpoint.respond(&caller, args))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| {
            tracing::error!(endpoint = %endpoint.id(), "handler panicked");
            Some(Reply::Failed(ClientCode::Internal))
        });

    let (Some(id), Some(reply)) = (id, reply) else {
        return;
    };
    let _ = out_tx.send(reply_frame(id, reply)).await;
}

/// Wire frame for the reply to call `id`.
pub fn reply_frame(id: u64, reply: Reply) -> String {
    match reply {
        Reply::Values(values) => reply_ok_json(id, &values)
            .unwrap_or_else(|e| reply_failed_json(id, e.client_code().as_str())),
        Reply::Rejected(reason) => reply_rejected_json(id, reason),
        Reply::Failed(code) => reply_failed_json(id, code.as_str()),
    }
}

/// Terminal failure before the call was accepted. With an id this is the
/// call's reply and must arrive; without one it is a protocol notice.
fn fail(out_tx: &mpsc::Sender<String>, id: Option<u64>, code: &str, msg: &str) {
    match id {
        Some(id) => {
            let frame = reply_failed_json(id, code);
            let tx = out_tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(frame).await;
            });
        }
        None => {
            let _ = out_tx.try_send(error_json(code, msg));
        }
    }
}
