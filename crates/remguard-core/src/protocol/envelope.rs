//! Call lane envelopes (JSON).
//!
//! The inbound envelope keeps `args` as `RawValue` so the gateway can route
//! (and reject unknown endpoints) before paying for argument decoding.

use serde::Deserialize;
use serde_json::{json, value::RawValue};

use crate::error::{GuardError, RejectReason, Result};
use crate::value::Value;

use super::convert::{value_from_json, value_to_json};

/// Protocol version understood by this crate.
pub const PROTOCOL_VERSION: u8 = 1;

/// Inbound call frame.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallEnvelope {
    /// Protocol version.
    pub v: u8,
    /// Target endpoint name.
    pub endpoint: String,
    /// Correlation id; required for request/response endpoints.
    #[serde(default)]
    pub id: Option<u64>,
    /// Positional arguments, stored as raw JSON (lazy parsing).
    #[serde(default)]
    pub args: Option<Box<RawValue>>,
}

impl CallEnvelope {
    pub fn parse(s: &str) -> Result<Self> {
        let env: CallEnvelope = serde_json::from_str(s)
            .map_err(|e| GuardError::BadRequest(format!("invalid envelope json: {e}")))?;
        if env.v != PROTOCOL_VERSION {
            return Err(GuardError::BadRequest(format!(
                "unsupported protocol version: {}",
                env.v
            )));
        }
        Ok(env)
    }

    /// Decode `args` into values. Missing `args` means no arguments.
    pub fn decode_args(&self) -> Result<Vec<Value>> {
        let Some(raw) = self.args.as_ref() else {
            return Ok(Vec::new());
        };
        let list: Vec<serde_json::Value> = serde_json::from_str(raw.get())
            .map_err(|e| GuardError::BadRequest(format!("args must be a json array: {e}")))?;
        list.into_iter().map(value_from_json).collect()
    }
}

/// Successful reply to a request/response call.
pub fn reply_ok_json(id: u64, values: &[Value]) -> Result<String> {
    let values = values
        .iter()
        .map(value_to_json)
        .collect::<Result<Vec<_>>>()?;
    Ok(json!({
        "v": PROTOCOL_VERSION,
        "type": "reply",
        "id": id,
        "ok": true,
        "values": values,
    })
    .to_string())
}

/// Terminal reply for a call that was rejected or whose handler failed.
pub fn reply_failed_json(id: u64, reason: &str) -> String {
    json!({
        "v": PROTOCOL_VERSION,
        "type": "reply",
        "id": id,
        "ok": false,
        "reason": reason,
    })
    .to_string()
}

/// Convenience for rejections.
pub fn reply_rejected_json(id: u64, reason: RejectReason) -> String {
    reply_failed_json(id, reason.as_str())
}

/// Notice sent right before the session is closed by a kick.
pub fn kicked_json(msg: &str) -> String {
    json!({
        "v": PROTOCOL_VERSION,
        "type": "kicked",
        "msg": msg,
    })
    .to_string()
}

/// Protocol-level error notice (malformed frame, unknown endpoint, ...).
pub fn error_json(code: &str, msg: &str) -> String {
    json!({
        "v": PROTOCOL_VERSION,
        "type": "error",
        "code": code,
        "msg": msg,
    })
    .to_string()
}
