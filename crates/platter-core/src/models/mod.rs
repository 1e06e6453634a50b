//! Domain models shared across the ingestion pipeline and the HTTP boundary.

pub mod media;
pub mod upload;

pub use media::{MediaKind, TranscodeOutcome};
pub use upload::{DeleteRequest, DeleteResponse, UploadResponse};
