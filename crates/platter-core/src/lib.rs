//! Platter Core Library
//!
//! This crate provides the domain models, error types, and configuration shared by
//! the storage, processing, and API crates of the media ingestion service.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, IngestionConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{MediaKind, TranscodeOutcome};
pub use storage_types::StorageBackend;
