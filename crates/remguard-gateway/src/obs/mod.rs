//! Lightweight in-process metrics (no metrics crate).
//!
//! Counters for forwarded calls, violations by reason, kicks and failing
//! punishments, stored as atomics and rendered by the `/metrics` handler.

pub mod metrics;

pub use metrics::GuardMetrics;
