//! remguard: argument guarding for remote endpoints.
//!
//! Depend on this crate alone. `prelude` covers what an embedding server
//! needs to register guarded endpoints and dispatch calls; the full core
//! and gateway APIs stay reachable under `core` and `gateway`.

pub mod core {
    pub use remguard_core::*;
}

pub mod gateway {
    pub use remguard_gateway::*;
}

pub mod prelude {
    pub use remguard_core::error::{ClientCode, GuardError, Result};
    pub use remguard_core::{HostObject, PrimitiveKind, RejectReason, Table, Value};
    pub use remguard_gateway::context::{CallerId, EndpointId};
    pub use remguard_gateway::dispatch::{
        CallOutcome, Dispatcher, EndpointConnection, EndpointHandler, EndpointKind, Punishment,
        Reply, SessionControl, Violation, ViolationMode,
    };
    pub use remguard_gateway::filter::{BufferInspector, Filters, TextFilter};
    pub use remguard_gateway::obs::GuardMetrics;
    pub use remguard_gateway::policy::{Bounds, EndpointOptions};
}
