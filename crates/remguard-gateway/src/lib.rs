//! remguard gateway library entry.
//!
//! This crate wires the argument guard (policy normalization, validation,
//! structural scanning, cooldowns, violation handling) into a dispatcher,
//! and ships a reference WebSocket transport plus built-in handlers. It is
//! intended to be consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod filter;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod router;
pub mod services;
pub mod session;
pub mod transport;
