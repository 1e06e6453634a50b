//! Input validation shared by configuration and the ingestion pipeline.

use crate::constants::MAX_FOLDER_LEN;

/// Check a caller-supplied folder tag.
///
/// Accepts 1..=64 characters made of `[A-Za-z0-9_-]` segments joined by `/`.
pub fn is_valid_folder(folder: &str) -> bool {
    if folder.is_empty() || folder.len() > MAX_FOLDER_LEN {
        return false;
    }

    folder.split('/').all(|segment| {
        !segment.is_empty()
            && segment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    })
}
