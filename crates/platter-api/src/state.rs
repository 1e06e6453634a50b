//! Shared application state

use platter_core::Config;
use platter_processing::IngestionPipeline;
use platter_storage::Storage;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub pipeline: IngestionPipeline,
}

impl AppState {
    pub fn new(config: Config, pipeline: IngestionPipeline) -> Self {
        Self { config, pipeline }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        self.pipeline.storage()
    }
}
