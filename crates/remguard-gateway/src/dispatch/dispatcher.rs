use std::sync::{Arc, Weak};

use dashmap::DashMap;

use remguard_core::error::{GuardError, Result};
use remguard_core::Value;

use crate::context::{CallerId, EndpointId};
use crate::filter::Filters;
use crate::obs::GuardMetrics;
use crate::policy::{CooldownTracker, EndpointOptions, PolicySet};

use super::endpoint::{CallOutcome, Endpoint, EndpointHandler, EndpointKind};
use super::violation::{SessionControl, ViolationHandler};

/// State shared by every endpoint of one dispatcher.
pub(crate) struct GuardRuntime {
    pub(crate) cooldowns: CooldownTracker,
    pub(crate) filters: Filters,
    pub(crate) violations: ViolationHandler,
    pub(crate) metrics: Arc<GuardMetrics>,
}

type EndpointMap = DashMap<EndpointId, Arc<Endpoint>>;

/// Registry and entry point for guarded endpoints.
pub struct Dispatcher {
    endpoints: Arc<EndpointMap>,
    rt: Arc<GuardRuntime>,
}

impl Dispatcher {
    pub fn new(sessions: Arc<dyn SessionControl>, filters: Filters, metrics: Arc<GuardMetrics>) -> Self {
        let rt = GuardRuntime {
            cooldowns: CooldownTracker::new(),
            filters,
            violations: ViolationHandler::new(sessions, Arc::clone(&metrics)),
            metrics,
        };
        Self {
            endpoints: Arc::new(DashMap::new()),
            rt: Arc::new(rt),
        }
    }

    /// Normalize `options` and bind `handler` to `name`.
    ///
    /// Configuration problems surface here, never at call time.
    pub fn register(
        &self,
        name: &str,
        kind: EndpointKind,
        options: EndpointOptions,
        handler: Arc<dyn EndpointHandler>,
    ) -> Result<EndpointConnection> {
        if name.is_empty() {
            return Err(GuardError::Config("endpoint name must not be empty".into()));
        }
        let policy = PolicySet::from_options(options)
            .map_err(|e| GuardError::Config(format!("endpoint {name}: {e}")))?;
        if policy.filter_string_content && self.rt.filters.text.is_none() {
            return Err(GuardError::Config(format!(
                "endpoint {name}: FilteringStrings requires a text filter"
            )));
        }
        if policy.buffer_size_limit.is_some() && self.rt.filters.buffers.is_none() {
            return Err(GuardError::Config(format!(
                "endpoint {name}: BufferSizeLimit requires a buffer inspector"
            )));
        }

        let id = EndpointId::new(name);
        let endpoint = Arc::new(Endpoint::new(
            id.clone(),
            kind,
            policy,
            handler,
            Arc::clone(&self.rt),
        ));

        match self.endpoints.entry(id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(GuardError::Config(format!("endpoint {name} is already registered")));
            }
            dashmap::mapref::entry::Entry::Vacant(e) => {
                e.insert(Arc::clone(&endpoint));
            }
        }
        tracing::info!(endpoint = %id, ?kind, "endpoint registered");

        Ok(EndpointConnection {
            endpoint,
            registry: Arc::downgrade(&self.endpoints),
            rt: Arc::clone(&self.rt),
        })
    }

    pub fn endpoint(&self, name: &str) -> Option<Arc<Endpoint>> {
        self.endpoints
            .get(&EndpointId::new(name))
            .map(|e| Arc::clone(e.value()))
    }

    pub fn registered_endpoints(&self) -> Vec<EndpointId> {
        self.endpoints.iter().map(|e| e.key().clone()).collect()
    }

    pub async fn dispatch(&self, caller: &CallerId, name: &str, args: Vec<Value>) -> Result<CallOutcome> {
        let Some(endpoint) = self.endpoint(name) else {
            self.rt.metrics.unknown_endpoint.inc(&[]);
            return Err(GuardError::UnknownEndpoint(name.to_string()));
        };
        Ok(endpoint.call(caller, args).await)
    }

    /// Evict per-caller state once the caller's session is gone.
    pub fn end_session(&self, caller: &CallerId) {
        self.rt.cooldowns.forget_caller(caller);
    }

    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.rt.cooldowns
    }

    pub fn metrics(&self) -> &GuardMetrics {
        &self.rt.metrics
    }
}

/// Live registration. Dropping it does not unregister; call
/// [`disconnect`](Self::disconnect).
pub struct EndpointConnection {
    endpoint: Arc<Endpoint>,
    registry: Weak<EndpointMap>,
    rt: Arc<GuardRuntime>,
}

impl EndpointConnection {
    pub fn endpoint(&self) -> &Arc<Endpoint> {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        let Some(map) = self.registry.upgrade() else {
            return false;
        };
        let connected = map
            .get(self.endpoint.id())
            .map(|e| Arc::ptr_eq(e.value(), &self.endpoint))
            .unwrap_or(false);
        connected
    }

    /// Remove the endpoint if this registration is still the live one.
    pub fn disconnect(&self) -> bool {
        let Some(map) = self.registry.upgrade() else {
            return false;
        };
        let removed = map
            .remove_if(self.endpoint.id(), |_, e| Arc::ptr_eq(e, &self.endpoint))
            .is_some();
        if removed {
            self.rt.cooldowns.forget_endpoint(self.endpoint.id());
            tracing::info!(endpoint = %self.endpoint.id(), "endpoint disconnected");
        }
        removed
    }
}
