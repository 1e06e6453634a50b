use crate::{
    LocalStorage, MemoryStorage, PublicUrlBase, S3Settings, S3Storage, Storage, StorageBackend,
    StorageError, StorageResult,
};
use platter_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let urls = PublicUrlBase::new(config.public_base_url());

    match config.storage_backend() {
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;

            let settings = S3Settings {
                bucket,
                region: config.s3_region().to_string(),
                endpoint_url: config.s3_endpoint().map(String::from),
                access_key_id: config.aws_access_key_id().map(String::from),
                secret_access_key: config.aws_secret_access_key().map(String::from),
            };

            let storage = S3Storage::new(settings, urls)?;
            Ok(Arc::new(storage))
        }

        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;

            let storage = LocalStorage::new(base_path, urls).await?;
            Ok(Arc::new(storage))
        }

        StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new(urls))),
    }
}
