//! Response to a detected violation.
//!
//! Order: custom punishment (detached), then kick when configured. Nothing
//! here returns an error to the call path.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use remguard_core::error::Result;
use remguard_core::RejectReason;

use crate::context::{CallerId, EndpointId};
use crate::obs::GuardMetrics;
use crate::policy::PolicySet;

/// What happens to the caller beyond rejecting the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ViolationMode {
    /// Drop the call silently.
    #[default]
    Default,
    /// Also terminate the caller's session.
    Kick,
}

/// A detected policy breach.
#[derive(Debug, Clone)]
pub struct Violation {
    pub endpoint: EndpointId,
    pub caller: CallerId,
    pub reason: RejectReason,
    /// 1-based position in `(caller, args...)`; absent for throttling.
    pub arg_index: Option<usize>,
}

/// User-supplied side effect run on every violation of an endpoint.
#[async_trait]
pub trait Punishment: Send + Sync {
    async fn punish(&self, caller: CallerId, arg_index: Option<usize>) -> Result<()>;
}

/// Ability to end a caller's session.
pub trait SessionControl: Send + Sync {
    /// Returns whether a live session was found.
    fn kick(&self, caller: &CallerId, message: &str) -> bool;
}

pub struct ViolationHandler {
    sessions: Arc<dyn SessionControl>,
    metrics: Arc<GuardMetrics>,
}

impl ViolationHandler {
    pub fn new(sessions: Arc<dyn SessionControl>, metrics: Arc<GuardMetrics>) -> Self {
        Self { sessions, metrics }
    }

    pub fn handle(&self, violation: &Violation, policy: &PolicySet) {
        tracing::warn!(
            endpoint = %violation.endpoint,
            caller = %violation.caller,
            reason = %violation.reason,
            arg_index = ?violation.arg_index,
            "call rejected"
        );
        self.metrics.violations.inc(&[
            ("endpoint", violation.endpoint.as_str()),
            ("reason", violation.reason.as_str()),
        ]);

        if let Some(p) = &policy.custom_punishment {
            self.spawn_punishment(Arc::clone(p), violation);
        }

        if policy.violation_mode == ViolationMode::Kick {
            if self.sessions.kick(&violation.caller, &policy.kick_message) {
                self.metrics
                    .kicks
                    .inc(&[("endpoint", violation.endpoint.as_str())]);
            } else {
                tracing::debug!(caller = %violation.caller, "kick requested for a session that is already gone");
            }
        }
    }

    fn spawn_punishment(&self, p: Arc<dyn Punishment>, violation: &Violation) {
        let Ok(rt) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime; custom punishment skipped");
            return;
        };
        let caller = violation.caller.clone();
        let endpoint = violation.endpoint.clone();
        let arg_index = violation.arg_index;
        let metrics = Arc::clone(&self.metrics);

        rt.spawn(async move {
            // Inner task so a panicking punishment surfaces as a JoinError.
            let outcome = tokio::spawn(async move { p.punish(caller, arg_index).await }).await;
            let failure = match outcome {
                Ok(Ok(())) => return,
                Ok(Err(e)) => e.to_string(),
                Err(e) => format!("punishment task aborted: {e}"),
            };
            tracing::warn!(endpoint = %endpoint, error = %failure, "custom punishment failed");
            metrics
                .punishment_failures
                .inc(&[("endpoint", endpoint.as_str())]);
        });
    }
}
