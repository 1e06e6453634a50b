//! Platter Processing Library
//!
//! Media processing and the ingestion orchestrator:
//!
//! - [`router`] classifies an upload by declared content type
//! - [`image`] bounds and re-encodes raster images to WebP
//! - [`video`] drives the transcoding runtime (ffmpeg) through a job state machine
//! - [`upload`] sequences routing, processing, key allocation and storage

pub mod error;
pub mod image;
pub mod router;
pub mod upload;
pub mod video;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use error::{IngestError, ProcessingError};
pub use self::image::{ImageNormalizer, NormalizedImage};
pub use router::route;
pub use upload::{IngestedAsset, IngestionPipeline, MediaAsset};
pub use video::{
    EngineSettings, FfmpegProvider, LazyRuntime, ProgressCallback, RuntimeProvider,
    TranscodeResult, TranscodeRuntime, VideoEngine, VideoInput,
};
