//! Wire contracts for the JSON call lane.
//!
//! - `envelope`: inbound call frames and outbound reply/kick frames.
//! - `convert`: mapping between JSON documents and [`Value`](crate::value::Value)
//!   graphs, including the `$type` conventions for buffers and host objects.
//!
//! All parsers are panic-free: malformed input is reported as `GuardError`
//! instead of panicking, keeping the gateway resilient to hostile traffic.

pub mod convert;
pub mod envelope;
