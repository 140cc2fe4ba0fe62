//! remguard gateway binary.
//!
//! - Loads `remguard.yaml` (or `$REMGUARD_CONFIG`) with strict parsing
//! - Registers every configured endpoint behind the argument guard
//! - Serves `/v1/ws?ticket=...`, `/healthz` and `/metrics`

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use remguard_core::error::{GuardError, Result};
use remguard_gateway::{app_state, config, router};

const DEFAULT_CONFIG_PATH: &str = "remguard.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("REMGUARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::load_from_file(&path)?;
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .map_err(|e| GuardError::BadRequest(format!("gateway.listen must be a valid SocketAddr: {e}")))?;

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "remguard-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| GuardError::Internal(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| GuardError::Internal(format!("server failed: {e}")))
}
