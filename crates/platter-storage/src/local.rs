use crate::keys::is_safe_key;
use crate::public_url::PublicUrlBase;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    urls: PublicUrlBase,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/platter/media")
    /// * `urls` - Public base the directory is served under
    pub async fn new(base_path: impl Into<PathBuf>, urls: PublicUrlBase) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path, urls })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Rejects keys with traversal sequences and keys whose existing path resolves
    /// outside the base directory (symlinks).
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if !is_safe_key(storage_key) {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);

        if let Ok(canonical) = path.canonicalize() {
            let base_canonical = self.base_path.canonicalize().map_err(|e| {
                StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
            })?;
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(self.url_for_key(storage_key))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(storage_key.to_string()));
            }
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn public_urls(&self) -> &PublicUrlBase {
        &self.urls
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::StorageKey;
    use tempfile::TempDir;

    async fn storage(dir: &TempDir) -> LocalStorage {
        LocalStorage::new(dir.path(), PublicUrlBase::new("http://localhost:4000/media"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_put_writes_file_under_key() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;
        let key = StorageKey::generate("restaurants/logos", "webp").to_string();

        let url = storage.put(&key, vec![7; 32], "image/webp").await.unwrap();

        assert_eq!(url, format!("http://localhost:4000/media/{}", key));
        let written = std::fs::read(dir.path().join(&key)).unwrap();
        assert_eq!(written, vec![7; 32]);
    }

    #[tokio::test]
    async fn test_delete_missing_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;

        let err = storage.delete("general/1-abcdef.bin").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_existing() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;
        let key = StorageKey::generate("general", "bin").to_string();
        storage.put(&key, vec![1], "application/octet-stream").await.unwrap();

        storage.delete(&key).await.unwrap();

        assert!(!storage.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;

        for key in ["../outside.bin", "/etc/passwd", "a/../../b"] {
            let err = storage.put(key, vec![0], "text/plain").await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key {}", key);
        }
    }

    #[tokio::test]
    async fn test_delete_io_failure_is_not_reported_as_missing() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir).await;
        std::fs::create_dir_all(dir.path().join("general/nested")).unwrap();

        let err = storage.delete("general/nested").await.unwrap_err();

        assert!(matches!(err, StorageError::DeleteFailed(_)), "got {:?}", err);
    }
}
