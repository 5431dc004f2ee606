//! sifter library - pairwise scoring server
//!
//! Serves pairs of text specimens to a browser and records an ordinal
//! preference score (1-5) for each, persisting after every submission.

use axum::Router;
use sifter_common::api::ClientConfig;
use std::collections::BTreeSet;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod client;
pub mod fonts;
pub mod session;

pub use session::ScoringService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Session state for the job being scored
    pub service: Arc<ScoringService>,
    /// Policy published to the browser client
    pub client_config: Arc<ClientConfig>,
    /// Page shell with font links already injected
    pub index_html: Arc<str>,
}

impl AppState {
    /// Create new application state
    pub fn new(service: Arc<ScoringService>, client_config: ClientConfig, fonts: &BTreeSet<String>) -> Self {
        let index_html = fonts::render_index(api::ui::INDEX_TEMPLATE, fonts);
        Self {
            service,
            client_config: Arc::new(client_config),
            index_html: index_html.into(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let scoring = Router::new()
        .route("/api/status", get(api::get_status))
        .route("/api/pair/:idx", get(api::get_pair))
        .route("/api/pair/:idx/score", post(api::submit_score))
        .route("/api/first-unscored", get(api::get_first_unscored))
        .route("/api/config", get(api::get_client_config));

    let public = Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(scoring)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
