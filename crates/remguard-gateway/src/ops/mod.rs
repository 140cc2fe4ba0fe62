//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/readyz`  : 503 once every guarded endpoint has been revoked
//! - `/metrics` : Prometheus text format

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::app_state::AppState;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    match state.dispatcher().registered_endpoints().len() {
        0 => (StatusCode::SERVICE_UNAVAILABLE, "no endpoints".to_string()),
        n => (StatusCode::OK, format!("ready ({n} endpoints)")),
    }
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.metrics().render(&state.metrics_extra());
    ([(header::CONTENT_TYPE, PROMETHEUS_TEXT)], body).into_response()
}
