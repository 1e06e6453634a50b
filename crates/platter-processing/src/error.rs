use platter_storage::StorageError;
use thiserror::Error;

/// Raster processing failures. Terminal for the upload they occur in.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Processing task failed: {0}")]
    Task(String),
}

/// Errors surfaced by the ingestion pipeline.
///
/// Transcoding failures never appear here; the video engine absorbs them.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("URL is not served by this storage: {0}")]
    UnresolvableKey(String),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
