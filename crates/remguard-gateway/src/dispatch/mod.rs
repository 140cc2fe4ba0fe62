//! Dispatcher module exports.
//!
//! Re-exports the dispatcher, the endpoint pipeline and the violation types
//! so downstream consumers can depend on this module directly.

pub mod dispatcher;
pub mod endpoint;
pub mod violation;

pub use dispatcher::{Dispatcher, EndpointConnection};
pub use endpoint::{CallOutcome, Endpoint, EndpointHandler, EndpointKind, Reply};
pub use violation::{Punishment, SessionControl, Violation, ViolationHandler, ViolationMode};
