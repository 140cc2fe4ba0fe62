//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use remguard_core::error::{GuardError, Result};

pub use schema::{BufferSection, EndpointConfig, FilterSection, GatewaySection, GuardConfig};

pub fn load_from_file(path: &str) -> Result<GuardConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| GuardError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GuardConfig> {
    let cfg: GuardConfig = serde_yaml::from_str(s)
        .map_err(|e| GuardError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
