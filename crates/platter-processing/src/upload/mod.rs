//! Ingestion orchestrator.

mod pipeline;
mod types;

pub use pipeline::IngestionPipeline;
pub use types::{derive_extension, IngestedAsset, MediaAsset};
