//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::public_url::PublicUrlBase;
use crate::StorageBackend;
use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem, in-memory) implement this trait so the
/// ingestion pipeline never couples to a specific store. Objects are create-on-put and
/// destroy-on-delete; there is no update in place.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `storage_key` and return its public URL.
    async fn put(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Delete the object at `storage_key`.
    ///
    /// Returns [`StorageError::NotFound`] if there is no such object.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Public base URL objects are served from
    fn public_urls(&self) -> &PublicUrlBase;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    fn url_for_key(&self, storage_key: &str) -> String {
        self.public_urls().url_for(storage_key)
    }

    /// Inverse of [`url_for_key`](Self::url_for_key). `None` means the URL was not issued
    /// under this backend's public base.
    fn key_for_url(&self, url: &str) -> Option<String> {
        self.public_urls().key_for(url)
    }
}
