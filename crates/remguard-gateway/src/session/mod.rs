//! Live caller sessions.
//!
//! The registry maps a caller to its outbound queue and kick signal, and is
//! the `SessionControl` the violation handler uses to kick callers.

mod registry;

pub use registry::{Connection, SessionRegistry};
