//! Decode-once codec for the transport layer.
//!
//! - Text frames => CallEnvelope (lazy `RawValue` for args)
//! - Binary frames are not part of the call lane
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use remguard_core::{
    error::{GuardError, Result},
    protocol::envelope::CallEnvelope,
};

#[derive(Debug)]
pub enum Inbound {
    Call { env: CallEnvelope, bytes_len: usize },
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => {
            let bytes_len = s.len();
            let env = CallEnvelope::parse(&s)?;
            Ok(Inbound::Call { env, bytes_len })
        }
        Message::Binary(_) => Err(GuardError::BadRequest(
            "binary frames are not accepted on the call lane".into(),
        )),
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(v) => Ok(Inbound::Pong(v)),
        Message::Close(_) => Ok(Inbound::Close),
    }
}

/// Cheap frame length, computed before any decoding.
pub fn frame_len(msg: &Message) -> usize {
    match msg {
        Message::Text(s) => s.len(),
        Message::Binary(b) => b.len(),
        Message::Ping(v) => v.len(),
        Message::Pong(v) => v.len(),
        Message::Close(_) => 0,
    }
}
