//! Identities shared across layers.
//!
//! Callers and endpoints are referenced by cheap, clonable ids so the
//! cooldown map and violation records never borrow from transport state.

pub mod ids;

pub use ids::{CallerId, EndpointId};
