//! Storage key allocation.
//!
//! Key format: `{folder}/{epoch_millis}-{suffix}.{ext}`. The timestamp keeps keys for one
//! folder in chronological order; uniqueness relies on the 36^6 suffix space and is never
//! checked against the store.

use std::fmt;

use platter_core::constants::KEY_SUFFIX_LEN;
pub use platter_core::validation::is_valid_folder;
use rand::Rng;

const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A freshly allocated storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKey {
    folder: String,
    epoch_millis: i64,
    suffix: String,
    extension: String,
}

impl StorageKey {
    /// Allocate a new key for `folder` with the given file extension.
    ///
    /// The folder is expected to have passed [`is_valid_folder`].
    pub fn generate(folder: &str, extension: &str) -> Self {
        StorageKey {
            folder: folder.to_string(),
            epoch_millis: chrono::Utc::now().timestamp_millis(),
            suffix: random_base36(KEY_SUFFIX_LEN),
            extension: extension.trim_start_matches('.').to_ascii_lowercase(),
        }
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn epoch_millis(&self) -> i64 {
        self.epoch_millis
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}-{}.{}",
            self.folder, self.epoch_millis, self.suffix, self.extension
        )
    }
}

fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| BASE36_ALPHABET[rng.random_range(0..BASE36_ALPHABET.len())] as char)
        .collect()
}

/// Reject keys that could escape a backend's namespace.
pub(crate) fn is_safe_key(key: &str) -> bool {
    !key.is_empty() && !key.contains("..") && !key.starts_with('/') && !key.contains('\\')
}
