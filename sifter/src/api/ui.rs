//! UI serving routes
//!
//! The page shell is rendered once at startup (font links injected) and held
//! in `AppState`; the script is served as-is.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::AppState;

/// Page shell; `<!-- FONT_LINKS -->` is replaced at startup
pub const INDEX_TEMPLATE: &str = include_str!("../ui/index.html");
const APP_JS: &str = include_str!("../ui/app.js");

/// GET /
pub async fn serve_index(State(state): State<AppState>) -> Html<String> {
    Html(state.index_html.to_string())
}

/// GET /static/app.js
pub async fn serve_app_js() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/javascript")],
        APP_JS,
    )
        .into_response()
}
