//! Scoring API
//!
//! Status, pair lookup, first-unscored lookup and score submission over the
//! job's `ScoringService`.

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    Json,
};
use serde_json::Value;
use std::num::IntErrorKind;
use sifter_common::api::{
    ClientConfig, FirstUnscoredResponse, OkResponse, PairView, StatusResponse,
};

use super::ApiError;
use crate::AppState;

/// Parse the `:idx` path segment
///
/// An integer too large for `i64` is still an index, just one outside every
/// dataset, so it is out of range rather than malformed.
fn parse_index(idx: Result<Path<String>, PathRejection>) -> Result<i64, ApiError> {
    let Path(raw) = idx.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    raw.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ApiError::OutOfRange,
        _ => ApiError::BadRequest(format!("Invalid index '{}': {}", raw, e)),
    })
}

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.service.status().await)
}

/// GET /api/pair/:idx
///
/// Returns 404 for an index outside the dataset.
pub async fn get_pair(
    State(state): State<AppState>,
    idx: Result<Path<String>, PathRejection>,
) -> Result<Json<PairView>, ApiError> {
    let idx = parse_index(idx)?;
    Ok(Json(state.service.record(idx).await?))
}

/// GET /api/first-unscored
pub async fn get_first_unscored(State(state): State<AppState>) -> Json<FirstUnscoredResponse> {
    Json(state.service.first_unscored().await)
}

/// POST /api/pair/:idx/score
///
/// Body: `{"score": 1..5}`. The index is checked first (404), then the score
/// (400). Responds only after the session has been written to disk.
pub async fn submit_score(
    State(state): State<AppState>,
    idx: Result<Path<String>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let idx = parse_index(idx)?;

    let value = body
        .ok()
        .and_then(|Json(body)| body.get("score").and_then(Value::as_i64));

    match value {
        Some(value) => state.service.submit_score(idx, value).await?,
        None => {
            state.service.check_index(idx).await?;
            return Err(ApiError::InvalidScore);
        }
    }

    Ok(Json(OkResponse::ok()))
}

/// GET /api/config
pub async fn get_client_config(State(state): State<AppState>) -> Json<ClientConfig> {
    Json(state.client_config.as_ref().clone())
}
