//! One guarded endpoint and its per-call pipeline.
//!
//! `Received -> CooldownChecked -> Validated -> Forwarded | Rejected`.
//! Each call ends in exactly one [`CallOutcome`]; request/response endpoints
//! turn every outcome into a [`Reply`].

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;

use remguard_core::error::{ClientCode, GuardError, Result};
use remguard_core::{RejectReason, Value};

use crate::context::{CallerId, EndpointId};
use crate::obs::GuardMetrics;
use crate::policy::{PolicySet, ScanContext, StructuralScanner, ValueValidator};

use super::dispatcher::GuardRuntime;
use super::violation::Violation;

/// Call shape of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointKind {
    /// Fire-and-forget; no reply.
    Event,
    /// Request/response; the caller always gets a reply.
    Function,
}

/// Business logic behind an endpoint.
#[async_trait]
pub trait EndpointHandler: Send + Sync {
    /// Receives the arguments exactly as the caller sent them. The returned
    /// values are the reply of a request/response endpoint.
    async fn handle(&self, caller: &CallerId, args: Vec<Value>) -> Result<Vec<Value>>;
}

/// Terminal state of one call.
#[derive(Debug)]
pub enum CallOutcome {
    Forwarded(Vec<Value>),
    Rejected(Violation),
    HandlerFailed(GuardError),
}

impl CallOutcome {
    pub fn is_forwarded(&self) -> bool {
        matches!(self, CallOutcome::Forwarded(_))
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            CallOutcome::Rejected(v) => Some(v.reason),
            _ => None,
        }
    }
}

/// What a request/response caller receives.
#[derive(Debug, PartialEq)]
pub enum Reply {
    Values(Vec<Value>),
    Rejected(RejectReason),
    Failed(ClientCode),
}

impl From<CallOutcome> for Reply {
    fn from(outcome: CallOutcome) -> Self {
        match outcome {
            CallOutcome::Forwarded(values) => Reply::Values(values),
            CallOutcome::Rejected(v) => Reply::Rejected(v.reason),
            CallOutcome::HandlerFailed(e) => Reply::Failed(e.client_code()),
        }
    }
}

pub struct Endpoint {
    id: EndpointId,
    kind: EndpointKind,
    policy: PolicySet,
    handler: Arc<dyn EndpointHandler>,
    rt: Arc<GuardRuntime>,
}

impl Endpoint {
    pub(crate) fn new(
        id: EndpointId,
        kind: EndpointKind,
        policy: PolicySet,
        handler: Arc<dyn EndpointHandler>,
        rt: Arc<GuardRuntime>,
    ) -> Self {
        Self { id, kind, policy, handler, rt }
    }

    pub fn id(&self) -> &EndpointId {
        &self.id
    }

    pub fn kind(&self) -> EndpointKind {
        self.kind
    }

    pub fn policy(&self) -> &PolicySet {
        &self.policy
    }

    pub fn metrics(&self) -> &GuardMetrics {
        &self.rt.metrics
    }

    pub async fn call(&self, caller: &CallerId, args: Vec<Value>) -> CallOutcome {
        self.call_at(caller, args, Instant::now()).await
    }

    /// Like [`call`](Self::call) with an explicit cooldown clock.
    pub async fn call_at(&self, caller: &CallerId, args: Vec<Value>, now: Instant) -> CallOutcome {
        let started = Instant::now();
        let outcome = self.run(caller, args, now).await;
        self.rt.metrics.dispatch_duration.observe(
            &[("endpoint", self.id.as_str())],
            started.elapsed(),
        );
        outcome
    }

    /// `None` for events; request/response endpoints always get `Some`.
    pub async fn respond(&self, caller: &CallerId, args: Vec<Value>) -> Option<Reply> {
        let outcome = self.call(caller, args).await;
        match self.kind {
            EndpointKind::Event => None,
            EndpointKind::Function => Some(Reply::from(outcome)),
        }
    }

    async fn run(&self, caller: &CallerId, args: Vec<Value>, now: Instant) -> CallOutcome {
        if !self
            .rt
            .cooldowns
            .check_and_record(caller, &self.id, now, self.policy.cooldown)
        {
            return self.reject(caller, RejectReason::Throttled, None);
        }

        if let Err((reason, index)) = self.validate_args(&args).await {
            return self.reject(caller, reason, Some(index));
        }

        tracing::debug!(endpoint = %self.id, caller = %caller, argc = args.len(), "forwarding call");
        match self.handler.handle(caller, args).await {
            Ok(values) => {
                self.rt
                    .metrics
                    .calls_forwarded
                    .inc(&[("endpoint", self.id.as_str())]);
                CallOutcome::Forwarded(values)
            }
            Err(e) => {
                tracing::warn!(endpoint = %self.id, caller = %caller, error = %e, "handler failed");
                self.rt
                    .metrics
                    .handler_errors
                    .inc(&[("endpoint", self.id.as_str())]);
                CallOutcome::HandlerFailed(e)
            }
        }
    }

    /// First failing argument wins. Indexes count the caller as argument 1.
    async fn validate_args(&self, args: &[Value]) -> std::result::Result<(), (RejectReason, usize)> {
        let validator = ValueValidator::new(&self.policy, &self.rt.filters);
        let scanner = StructuralScanner::new(&validator);
        let mut ctx = ScanContext::new();

        for (i, arg) in args.iter().enumerate() {
            let index = i + 2;
            validator.validate_value(arg).await.map_err(|r| (r, index))?;
            if let Value::Table(t) = arg {
                if self.policy.scan_tables {
                    scanner.scan(t, &mut ctx).await.map_err(|r| (r, index))?;
                }
            }
        }
        Ok(())
    }

    fn reject(&self, caller: &CallerId, reason: RejectReason, arg_index: Option<usize>) -> CallOutcome {
        let violation = Violation {
            endpoint: self.id.clone(),
            caller: caller.clone(),
            reason,
            arg_index,
        };
        self.rt.violations.handle(&violation, &self.policy);
        CallOutcome::Rejected(violation)
    }
}
