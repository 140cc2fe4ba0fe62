use std::collections::HashSet;

use serde::Deserialize;
use remguard_core::error::{GuardError, Result};

use crate::dispatch::EndpointKind;
use crate::policy::EndpointOptions;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub filter: FilterSection,

    #[serde(default)]
    pub buffers: BufferSection,

    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

impl GuardConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GuardError::BadRequest(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        if self.endpoints.is_empty() {
            return Err(GuardError::BadRequest("endpoints must not be empty".into()));
        }

        let mut seen = HashSet::new();
        for e in &self.endpoints {
            if e.name.is_empty() {
                return Err(GuardError::BadRequest("endpoint name must not be empty".into()));
            }
            if !seen.insert(e.name.as_str()) {
                return Err(GuardError::BadRequest(format!(
                    "duplicate endpoint name: {}",
                    e.name
                )));
            }
        }

        self.gateway.validate()?;
        self.filter.validate()?;
        self.buffers.validate()?;

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    #[serde(default = "default_max_inflight_calls")]
    pub max_inflight_calls: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            max_frame_bytes: default_max_frame_bytes(),
            max_inflight_calls: default_max_inflight_calls(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(GuardError::BadRequest(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(GuardError::BadRequest(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(GuardError::BadRequest(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if !(256..=1_048_576).contains(&self.max_frame_bytes) {
            return Err(GuardError::BadRequest(
                "gateway.max_frame_bytes must be between 256 and 1048576".into(),
            ));
        }
        if !(1..=4096).contains(&self.max_inflight_calls) {
            return Err(GuardError::BadRequest(
                "gateway.max_inflight_calls must be between 1 and 4096".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_max_frame_bytes() -> usize {
    65536
}
fn default_max_inflight_calls() -> usize {
    64
}

/// Reference word-list text filter.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSection {
    #[serde(default)]
    pub blocked_words: Vec<String>,

    #[serde(default = "default_lookup_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            blocked_words: Vec::new(),
            timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

impl FilterSection {
    pub fn validate(&self) -> Result<()> {
        validate_lookup_timeout("filter.timeout_ms", self.timeout_ms)
    }
}

/// Decompressed-size lookup for buffer arguments.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BufferSection {
    #[serde(default = "default_lookup_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for BufferSection {
    fn default() -> Self {
        Self { timeout_ms: default_lookup_timeout_ms() }
    }
}

impl BufferSection {
    pub fn validate(&self) -> Result<()> {
        validate_lookup_timeout("buffers.timeout_ms", self.timeout_ms)
    }
}

fn default_lookup_timeout_ms() -> u64 {
    500
}

fn validate_lookup_timeout(field: &str, ms: u64) -> Result<()> {
    if !(1..=10000).contains(&ms) {
        return Err(GuardError::BadRequest(format!(
            "{field} must be between 1 and 10000"
        )));
    }
    Ok(())
}

/// One guarded endpoint. `options` is lenient: unknown option keys are
/// ignored so configs stay forward-compatible.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    pub name: String,
    pub kind: EndpointKind,
    pub handler: String,
    #[serde(default)]
    pub options: EndpointOptions,
}
