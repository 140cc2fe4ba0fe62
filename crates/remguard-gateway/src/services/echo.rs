use async_trait::async_trait;

use remguard_core::error::Result;
use remguard_core::Value;

use crate::context::CallerId;
use crate::dispatch::EndpointHandler;

/// Replies with the arguments it was given.
#[derive(Default)]
pub struct EchoHandler;

impl EchoHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EndpointHandler for EchoHandler {
    async fn handle(&self, _caller: &CallerId, args: Vec<Value>) -> Result<Vec<Value>> {
        Ok(args)
    }
}
