//! HTTP API handlers for sifter

pub mod buildinfo;
pub mod error;
pub mod health;
pub mod pairs;
pub mod ui;

pub use buildinfo::get_build_info;
pub use error::ApiError;
pub use health::health_routes;
pub use pairs::{get_client_config, get_first_unscored, get_pair, get_status, submit_score};
pub use ui::{serve_app_js, serve_index};
