//! API error responses
//!
//! Every error is returned as `{"error": "<message>"}` with a matching status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sifter_common::api::ErrorResponse;
use sifter_common::Error;

/// Scoring API errors
#[derive(Debug)]
pub enum ApiError {
    /// Index outside `0..total`
    OutOfRange,
    /// Score missing or not in 1..=5
    InvalidScore,
    /// Unparseable path or body
    BadRequest(String),
    /// Persistence or other server-side failure
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::OutOfRange { .. } => ApiError::OutOfRange,
            Error::InvalidScore(_) => ApiError::InvalidScore,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::OutOfRange => (StatusCode::NOT_FOUND, "out of range".to_string()),
            ApiError::InvalidScore => (StatusCode::BAD_REQUEST, "score must be 1-5".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
