//! remguard core: argument value model, error types, and the wire envelope.
//!
//! This crate defines the value graph that guarded endpoints receive, the
//! rejection vocabulary, and the JSON call/reply contracts shared by the
//! gateway and SDK tooling. It carries no transport or runtime dependencies
//! so it can be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `GuardError`/`Result` so production
//! processes do not crash on malformed input or bad traffic.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;
pub mod value;

/// Shared result type.
pub use error::{GuardError, RejectReason, Result};
pub use value::{FunctionRef, HostObject, PrimitiveKind, Table, TableId, Value};
