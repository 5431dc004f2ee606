//! API module for the shared HTTP surface
//!
//! Request/response types used by the server handlers and by the HTTP
//! client backend. No HTTP framework dependencies live here.

pub mod types;

pub use types::{
    ClientConfig, ErrorResponse, FirstUnscoredResponse, OkResponse, PairView, ScoreRequest,
    StatusResponse,
};
