//! Shared application state for the remguard gateway.
//!
//! Builds the dispatcher from config, registers the configured endpoints
//! against built-in handlers, and owns session lifecycle hooks. Startup
//! errors are returned, never panicked.

use std::sync::Arc;
use std::time::Duration;

use remguard_core::error::{GuardError, Result};

use crate::config::GuardConfig;
use crate::context::CallerId;
use crate::dispatch::{Dispatcher, EndpointConnection};
use crate::filter::{Filters, LengthPrefixedInspector, WordListFilter};
use crate::obs::GuardMetrics;
use crate::services;
use crate::session::{Connection, SessionRegistry};

/// Longest accepted caller identity.
const MAX_CALLER_ID_LEN: usize = 64;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    dispatcher: Arc<Dispatcher>,
    sessions: Arc<SessionRegistry>,
    metrics: Arc<GuardMetrics>,
}

struct AppStateInner {
    cfg: GuardConfig,
    // Kept so endpoints can be revoked at runtime.
    connections: Vec<EndpointConnection>,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GuardConfig) -> Result<Self> {
        let metrics = Arc::new(GuardMetrics::default());
        let sessions = Arc::new(SessionRegistry::new());

        let filters = Filters::none()
            .with_text_filter(
                Arc::new(WordListFilter::new(&cfg.filter.blocked_words)),
                Duration::from_millis(cfg.filter.timeout_ms),
            )
            .with_buffer_inspector(
                Arc::new(LengthPrefixedInspector),
                Duration::from_millis(cfg.buffers.timeout_ms),
            );

        let dispatcher = Dispatcher::new(sessions.clone(), filters, Arc::clone(&metrics));

        let mut connections = Vec::with_capacity(cfg.endpoints.len());
        for e in &cfg.endpoints {
            let handler = services::builtin(&e.handler).ok_or_else(|| {
                GuardError::Config(format!(
                    "endpoint {} uses unknown handler {} (known: {:?})",
                    e.name,
                    e.handler,
                    services::BUILTIN_HANDLERS
                ))
            })?;
            let conn = dispatcher.register(&e.name, e.kind, e.options.clone(), handler)?;
            connections.push(conn);
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg, connections }),
            dispatcher: Arc::new(dispatcher),
            sessions,
            metrics,
        })
    }

    pub fn cfg(&self) -> &GuardConfig {
        &self.inner.cfg
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn sessions(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.sessions)
    }

    pub fn metrics(&self) -> &GuardMetrics {
        &self.metrics
    }

    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("remguard_cooldown_entries", self.dispatcher.cooldowns().len() as u64),
            ("remguard_endpoints_registered", self.dispatcher.registered_endpoints().len() as u64),
        ]
    }

    /// Revoke a configured endpoint. Returns false if it was not live.
    pub fn disconnect_endpoint(&self, name: &str) -> bool {
        self.inner
            .connections
            .iter()
            .find(|c| c.endpoint().id().as_str() == name)
            .map(|c| c.disconnect())
            .unwrap_or(false)
    }

    /// The ticket is the caller identity; only its shape is checked.
    pub fn resolve_caller(&self, ticket: &str) -> Result<CallerId> {
        let ok = !ticket.is_empty()
            && ticket.len() <= MAX_CALLER_ID_LEN
            && ticket
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':');
        if !ok {
            return Err(GuardError::AuthFailed);
        }
        Ok(CallerId::new(ticket))
    }

    /// Track a new session; an older session of the same caller is kicked.
    pub fn begin_session(&self, caller: &CallerId, conn: Connection) -> u64 {
        let (seq, previous) = self.sessions.insert(caller.clone(), conn);
        if let Some(old) = previous {
            old.kick("session replaced by a newer connection");
        } else {
            self.metrics.sessions_active.inc(&[]);
        }
        seq
    }

    /// Drop session state and the caller's cooldown entries.
    pub fn end_session(&self, caller: &CallerId, seq: u64) {
        if self.sessions.remove_session(caller, seq).is_some() {
            self.dispatcher.end_session(caller);
            self.metrics.sessions_active.dec(&[]);
        }
    }
}
