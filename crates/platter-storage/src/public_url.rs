//! Reversible mapping between storage keys and public URLs.

/// The configured public base every object URL is issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicUrlBase {
    base: String,
}

impl PublicUrlBase {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        PublicUrlBase {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Public URL for a key: `{base}/{key}`
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base, key)
    }

    /// Recover the key from a URL issued by [`url_for`](Self::url_for).
    ///
    /// Returns `None` when the URL is not under this base.
    pub fn key_for(&self, url: &str) -> Option<String> {
        let key = url.trim().strip_prefix(&self.base)?.strip_prefix('/')?;
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::StorageKey;

    #[test]
    fn test_round_trip() {
        let urls = PublicUrlBase::new("https://cdn.example.com/media/");
        for folder in ["general", "products", "restaurants/logos"] {
            let key = StorageKey::generate(folder, "webp").to_string();
            let url = urls.url_for(&key);
            assert_eq!(url, format!("https://cdn.example.com/media/{}", key));
            assert_eq!(urls.key_for(&url).as_deref(), Some(key.as_str()));
        }
    }

    #[test]
    fn test_foreign_url_not_derivable() {
        let urls = PublicUrlBase::new("https://cdn.example.com");
        assert_eq!(urls.key_for("https://evil.example.org/products/1-abc.webp"), None);
        assert_eq!(urls.key_for("https://cdn.example.com"), None);
        assert_eq!(urls.key_for("https://cdn.example.com/"), None);
        // Prefix match must end on a path boundary
        assert_eq!(urls.key_for("https://cdn.example.com.evil.org/x.webp"), None);
    }
}
