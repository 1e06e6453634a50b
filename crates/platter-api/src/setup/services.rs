//! Storage and pipeline construction

use crate::state::AppState;
use anyhow::{Context, Result};
use platter_core::Config;
use platter_processing::IngestionPipeline;
use platter_storage::create_storage;
use std::sync::Arc;

/// Build the storage backend and ingestion pipeline. The transcoding runtime is not
/// loaded here; it loads on the first video upload.
pub async fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(
        backend = %storage.backend_type(),
        public_base_url = %storage.public_urls().as_str(),
        "Storage backend initialized"
    );

    let pipeline = IngestionPipeline::from_config(config, storage)
        .context("Failed to initialize ingestion pipeline")?;

    Ok(Arc::new(AppState::new(config.clone(), pipeline)))
}
