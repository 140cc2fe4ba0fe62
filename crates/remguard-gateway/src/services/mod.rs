//! Built-in endpoint handlers.
//!
//! Real deployments register their own `EndpointHandler`s; these exist so the
//! gateway binary can be exercised end to end from a config file.

mod echo;
mod sink;

use std::sync::Arc;

use crate::dispatch::EndpointHandler;

pub use echo::EchoHandler;
pub use sink::SinkHandler;

/// Names accepted in the `handler` field of an endpoint config.
pub const BUILTIN_HANDLERS: [&str; 2] = ["echo", "sink"];

pub fn builtin(name: &str) -> Option<Arc<dyn EndpointHandler>> {
    match name {
        "echo" => Some(Arc::new(EchoHandler::new())),
        "sink" => Some(Arc::new(SinkHandler::new())),
        _ => None,
    }
}
