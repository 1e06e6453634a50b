//! Type router: picks the processing path for an upload.

use platter_core::MediaKind;

/// Classify a declared content type.
///
/// Unrecognized or missing types fall through to [`MediaKind::Other`] and are stored
/// unmodified; routing never rejects an upload.
pub fn route(content_type: &str) -> MediaKind {
    let content_type = content_type.trim().to_ascii_lowercase();

    if content_type.starts_with("image/") {
        MediaKind::Image
    } else if content_type.starts_with("video/") {
        MediaKind::Video
    } else {
        MediaKind::Other
    }
}
