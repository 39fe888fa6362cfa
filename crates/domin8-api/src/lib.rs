//! Domin8 API Library
//!
//! This crate provides the HTTP handlers, the per-request watermarking pipeline, and
//! application setup.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
mod utils;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use services::pipeline::PipelineOrchestrator;
pub use state::AppState;
