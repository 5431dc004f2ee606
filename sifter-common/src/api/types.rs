//! Shared API request/response types
//!
//! # Examples
//!
//! ```
//! use sifter_common::api::types::StatusResponse;
//!
//! let status = StatusResponse { total: 3, scored: 1 };
//! assert_eq!(
//!     serde_json::to_value(&status).unwrap(),
//!     serde_json::json!({"total": 3, "scored": 1})
//! );
//! ```

use serde::{Deserialize, Serialize};

use crate::dataset::Record;
use crate::score::Score;

// ========================================
// Scoring Types
// ========================================

/// GET /api/status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub total: usize,
    pub scored: usize,
}

/// GET /api/pair/{idx}: a record merged with its index and current score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairView {
    pub index: usize,
    #[serde(flatten)]
    pub record: Record,
    pub score: Option<Score>,
}

/// GET /api/first-unscored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstUnscoredResponse {
    pub index: usize,
}

/// POST /api/pair/{idx}/score request body
///
/// The server reads the body loosely so a non-integer score is reported as an
/// invalid score rather than a deserialization failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRequest {
    pub score: i64,
}

/// Acknowledgement for a persisted score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// GET /api/config: policy the browser client needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub job: String,
    pub auto_advance: bool,
}

// ========================================
// Error Response Types
// ========================================

/// Body of every 4xx/5xx API response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// ========================================
// Tests
// ========================================
