//! Transport layer (WebSocket).
//!
//! Exposes the WS upgrade handler, the codec that decodes call envelopes,
//! and the socket-independent call handling between them and the dispatcher.

pub mod call;
pub mod codec;
pub mod ws;
