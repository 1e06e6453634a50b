use crate::keys::is_safe_key;
use crate::object::{delete_object, object_exists, put_object};
use crate::public_url::PublicUrlBase;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use object_store::memory::InMemory;
use std::sync::Arc;

/// In-memory storage implementation for development and tests.
///
/// Contents live for the lifetime of the process. Clones share the same store.
#[derive(Clone)]
pub struct MemoryStorage {
    store: Arc<InMemory>,
    urls: PublicUrlBase,
}

impl MemoryStorage {
    pub fn new(urls: PublicUrlBase) -> Self {
        MemoryStorage {
            store: Arc::new(InMemory::new()),
            urls,
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String> {
        if !is_safe_key(storage_key) {
            return Err(StorageError::InvalidKey(storage_key.to_string()));
        }

        let size = data.len();
        put_object(self.store.as_ref(), storage_key, data, content_type).await?;

        tracing::debug!(
            key = %storage_key,
            content_type = %content_type,
            size_bytes = size,
            "In-memory upload successful"
        );

        Ok(self.url_for_key(storage_key))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        if !is_safe_key(storage_key) {
            return Err(StorageError::InvalidKey(storage_key.to_string()));
        }

        delete_object(self.store.as_ref(), storage_key).await?;
        tracing::debug!(key = %storage_key, "In-memory delete successful");
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        object_exists(self.store.as_ref(), storage_key).await
    }

    fn public_urls(&self) -> &PublicUrlBase {
        &self.urls
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::StorageKey;

    fn storage() -> MemoryStorage {
        MemoryStorage::new(PublicUrlBase::new("https://media.example.com"))
    }

    #[tokio::test]
    async fn test_put_returns_reversible_url() {
        let storage = storage();
        let key = StorageKey::generate("products", "webp").to_string();

        let url = storage.put(&key, vec![1, 2, 3], "image/webp").await.unwrap();

        assert_eq!(storage.key_for_url(&url).as_deref(), Some(key.as_str()));
        assert!(storage.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_removes_object() {
        let storage = storage();
        let key = StorageKey::generate("general", "bin").to_string();
        storage
            .put(&key, b"hello".to_vec(), "application/octet-stream")
            .await
            .unwrap();

        storage.delete(&key).await.unwrap();

        assert!(!storage.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_reports_not_found() {
        let storage = storage();
        let kept = StorageKey::generate("general", "bin").to_string();
        storage
            .put(&kept, b"keep".to_vec(), "application/octet-stream")
            .await
            .unwrap();

        let err = storage.delete("general/0-zzzzzz.bin").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));

        // Failed delete leaves other objects untouched
        assert!(storage.exists(&kept).await.unwrap());
        storage.delete(&kept).await.unwrap();
        assert!(matches!(
            storage.delete(&kept).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_unsafe_keys() {
        let storage = storage();

        for key in ["../outside.bin", "/etc/passwd", ""] {
            let err = storage.delete(key).await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key {:?}", key);
        }
    }
}
