//! Axum router wiring: the call lane upgrade plus ops endpoints.

use axum::{routing::get, Router};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    let ops: Router<AppState> = Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics));

    Router::new()
        .route("/v1/ws", get(transport::ws::ws_upgrade))
        .merge(ops)
        .with_state(state)
}
