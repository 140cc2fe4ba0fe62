use async_trait::async_trait;

use remguard_core::error::Result;
use remguard_core::Value;

use crate::context::CallerId;
use crate::dispatch::EndpointHandler;

/// Accepts and discards; useful for fire-and-forget endpoints.
#[derive(Default)]
pub struct SinkHandler;

impl SinkHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EndpointHandler for SinkHandler {
    async fn handle(&self, caller: &CallerId, args: Vec<Value>) -> Result<Vec<Value>> {
        tracing::debug!(%caller, argc = args.len(), "sink received call");
        Ok(Vec::new())
    }
}
