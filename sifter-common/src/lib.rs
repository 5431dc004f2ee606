//! # Sifter Common Library
//!
//! Shared code for the sifter labeling server and its tools:
//! - Record and score types
//! - Dataset store (load, resume, atomic persist)
//! - API request/response types
//! - Configuration loading and job path resolution
//! - Job input generation

pub mod api;
pub mod config;
pub mod dataset;
pub mod error;
pub mod generate;
pub mod score;

pub use dataset::{DatasetStore, Record};
pub use error::{Error, Result};
pub use score::Score;
