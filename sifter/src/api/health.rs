//! Liveness endpoint
//!
//! Answers from the session lock, so a stuck persist shows up here as a hang
//! rather than a false "ok".

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    /// Job being scored
    pub job: String,
    pub total: usize,
    pub scored: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let progress = state.service.status().await;
    Json(HealthResponse {
        status: "ok",
        module: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        job: state.client_config.job.clone(),
        total: progress.total,
        scored: progress.scored,
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
