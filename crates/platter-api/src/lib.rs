//! Platter API Library
//!
//! This crate provides the HTTP boundary of the media ingestion service: upload and
//! delete handlers, health probes, the OpenAPI document, error rendering and setup.

pub mod api_doc;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
