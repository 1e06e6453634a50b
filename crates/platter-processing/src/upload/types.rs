//! Types for the upload pipeline.

use bytes::Bytes;
use platter_core::constants::FALLBACK_EXTENSION;
use platter_core::{MediaKind, TranscodeOutcome};

const MAX_EXTENSION_LEN: usize = 10;

/// An upload as received from the caller. Owned by the request.
#[derive(Clone, Debug)]
pub struct MediaAsset {
    pub data: Bytes,
    pub content_type: String,
    pub filename: Option<String>,
}

/// What the pipeline stored for one upload.
#[derive(Clone, Debug)]
pub struct IngestedAsset {
    pub key: String,
    pub url: String,
    pub size: u64,
    pub content_type: String,
    pub kind: MediaKind,
    pub thumbnail_url: Option<String>,
    /// Set for video uploads only
    pub outcome: Option<TranscodeOutcome>,
}

fn clean_extension(candidate: &str) -> Option<String> {
    let ext = candidate.trim().to_ascii_lowercase();
    let valid = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then_some(ext)
}

/// Extension for content stored as uploaded.
///
/// Taken from the filename when it has a usable one, else from the content-type subtype,
/// else `bin`.
pub fn derive_extension(filename: Option<&str>, content_type: &str) -> String {
    let from_filename = filename
        .and_then(|name| name.rsplit_once('.'))
        .and_then(|(stem, ext)| (!stem.is_empty()).then_some(ext))
        .and_then(clean_extension);

    let from_content_type = || {
        content_type
            .split(';')
            .next()
            .and_then(|mime| mime.split_once('/'))
            .map(|(_, subtype)| subtype.split('+').next().unwrap_or(subtype))
            .and_then(clean_extension)
    };

    from_filename
        .or_else(from_content_type)
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}
