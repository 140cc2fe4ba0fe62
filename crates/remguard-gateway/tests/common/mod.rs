//! Shared fixtures for gateway integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use remguard_core::error::{GuardError, Result};
use remguard_core::Value;
use remguard_gateway::context::CallerId;
use remguard_gateway::dispatch::{Dispatcher, EndpointHandler, SessionControl};
use remguard_gateway::filter::{Filters, LengthPrefixedInspector, WordListFilter};
use remguard_gateway::obs::GuardMetrics;

/// Records kicks instead of closing anything.
#[derive(Default)]
pub struct RecordingSessions {
    pub kicks: Mutex<Vec<(String, String)>>,
}

impl SessionControl for RecordingSessions {
    fn kick(&self, caller: &CallerId, message: &str) -> bool {
        self.kicks
            .lock()
            .unwrap()
            .push((caller.to_string(), message.to_string()));
        true
    }
}

/// Echo handler that counts and remembers its invocations.
#[derive(Default)]
pub struct CountingHandler {
    pub calls: AtomicUsize,
    pub last_args: Mutex<Vec<Value>>,
}

impl CountingHandler {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EndpointHandler for CountingHandler {
    async fn handle(&self, _caller: &CallerId, args: Vec<Value>) -> Result<Vec<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_args.lock().unwrap() = args.clone();
        Ok(args)
    }
}

/// Always fails.
pub struct FailingHandler;

#[async_trait]
impl EndpointHandler for FailingHandler {
    async fn handle(&self, _caller: &CallerId, _args: Vec<Value>) -> Result<Vec<Value>> {
        Err(GuardError::Handler("boom".into()))
    }
}

pub fn filters() -> Filters {
    Filters::none()
        .with_text_filter(
            Arc::new(WordListFilter::new(["badword"])),
            std::time::Duration::from_millis(200),
        )
        .with_buffer_inspector(
            Arc::new(LengthPrefixedInspector),
            std::time::Duration::from_millis(200),
        )
}

pub fn dispatcher() -> (Dispatcher, Arc<RecordingSessions>) {
    let sessions = Arc::new(RecordingSessions::default());
    let d = Dispatcher::new(sessions.clone(), filters(), Arc::new(GuardMetrics::default()));
    (d, sessions)
}

pub fn caller(name: &str) -> CallerId {
    CallerId::new(name)
}
