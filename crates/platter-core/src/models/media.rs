use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Processing route for an incoming asset, decided from its declared content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Other => "other",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a video transcode job ended.
///
/// Every variant other than `Compressed` means the stored bytes are the original upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TranscodeOutcome {
    /// Encoded output was strictly smaller and replaced the original.
    Compressed,
    /// Encoded output was not smaller; original kept.
    SkippedNotSmaller,
    /// Input exceeded the transcode size ceiling; engine not invoked.
    SkippedOversized,
    /// Runtime load, staging, or encoding failed; original kept.
    Failed,
}

impl TranscodeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscodeOutcome::Compressed => "compressed",
            TranscodeOutcome::SkippedNotSmaller => "skipped_not_smaller",
            TranscodeOutcome::SkippedOversized => "skipped_oversized",
            TranscodeOutcome::Failed => "failed",
        }
    }
}

impl fmt::Display for TranscodeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
