//! Upload pipeline: route → process → allocate key → store.
//!
//! The pipeline is the only component that sees a whole upload. Each request runs its
//! stages in order; the first failing stage ends the request with a single error and
//! nothing is stored after a failed `put`.

use std::sync::Arc;

use bytes::Bytes;
use platter_core::{Config, MediaKind, TranscodeOutcome};
use platter_storage::{is_valid_folder, Storage, StorageKey};

use super::types::{derive_extension, IngestedAsset, MediaAsset};
use crate::error::IngestError;
use crate::image::{ImageNormalizer, NormalizedImage};
use crate::router::route;
use crate::video::{EngineSettings, FfmpegProvider, ProgressCallback, VideoEngine, VideoInput};

/// Bytes ready to store, as produced by one of the processing paths.
struct Processed {
    data: Bytes,
    content_type: String,
    extension: String,
    thumbnail: Option<NormalizedImage>,
    outcome: Option<TranscodeOutcome>,
}

#[derive(Clone)]
pub struct IngestionPipeline {
    storage: Arc<dyn Storage>,
    normalizer: ImageNormalizer,
    engine: VideoEngine,
    default_folder: String,
}

impl IngestionPipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        normalizer: ImageNormalizer,
        engine: VideoEngine,
        default_folder: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            normalizer,
            engine,
            default_folder: default_folder.into(),
        }
    }

    /// Build the production pipeline: ffmpeg-backed engine, default normalizer.
    pub fn from_config(config: &Config, storage: Arc<dyn Storage>) -> anyhow::Result<Self> {
        let provider = Arc::new(FfmpegProvider::new(config.ffmpeg_path())?);
        let normalizer = ImageNormalizer::default();
        let engine = VideoEngine::new(
            provider,
            normalizer,
            EngineSettings {
                max_input_bytes: config.max_transcode_input_bytes(),
                max_concurrent_jobs: config.max_concurrent_transcodes(),
            },
        );

        Ok(Self::new(
            storage,
            normalizer,
            engine,
            config.default_folder(),
        ))
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn engine(&self) -> &VideoEngine {
        &self.engine
    }

    /// Process and store one upload.
    ///
    /// `folder` defaults to the configured folder when absent or blank. `progress` only
    /// receives updates for video uploads.
    pub async fn ingest(
        &self,
        asset: MediaAsset,
        folder: Option<&str>,
        progress: Option<ProgressCallback>,
    ) -> Result<IngestedAsset, IngestError> {
        if asset.data.is_empty() {
            return Err(IngestError::Validation("No file provided".to_string()));
        }

        let folder = folder
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(&self.default_folder);
        if !is_valid_folder(folder) {
            return Err(IngestError::Validation(format!(
                "Invalid folder '{}': use 1-64 characters of letters, digits, '_', '-' and '/'",
                folder
            )));
        }

        let start = std::time::Instant::now();
        let input_bytes = asset.data.len();
        let kind = route(&asset.content_type);

        let processed = match kind {
            MediaKind::Image => self.process_image(asset).await?,
            MediaKind::Video => self.process_video(asset, progress).await,
            MediaKind::Other => Processed {
                extension: derive_extension(asset.filename.as_deref(), &asset.content_type),
                data: asset.data,
                content_type: asset.content_type,
                thumbnail: None,
                outcome: None,
            },
        };

        let key = StorageKey::generate(folder, &processed.extension).to_string();
        let size = processed.data.len() as u64;
        let url = self
            .storage
            .put(&key, Vec::from(processed.data), &processed.content_type)
            .await?;

        let thumbnail_url = match processed.thumbnail {
            Some(thumbnail) => self.store_thumbnail(folder, thumbnail).await,
            None => None,
        };

        tracing::info!(
            key = %key,
            kind = %kind,
            content_type = %processed.content_type,
            input_bytes,
            size_bytes = size,
            outcome = processed.outcome.map(|o| o.as_str()),
            has_thumbnail = thumbnail_url.is_some(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload ingested"
        );

        Ok(IngestedAsset {
            key,
            url,
            size,
            content_type: processed.content_type,
            kind,
            thumbnail_url,
            outcome: processed.outcome,
        })
    }

    /// Delete a previously issued object by its public URL. Returns the deleted key.
    ///
    /// A URL outside the configured public base is rejected before any backend call.
    pub async fn remove(&self, url: Option<&str>) -> Result<String, IngestError> {
        let url = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| IngestError::Validation("No URL provided".to_string()))?;

        let key = self
            .storage
            .key_for_url(url)
            .ok_or_else(|| IngestError::UnresolvableKey(url.to_string()))?;

        self.storage.delete(&key).await?;

        tracing::info!(key = %key, "Media deleted");
        Ok(key)
    }

    async fn process_image(&self, asset: MediaAsset) -> Result<Processed, IngestError> {
        let normalized = self.normalizer.normalize_bytes(asset.data).await?;

        Ok(Processed {
            data: normalized.data,
            content_type: normalized.content_type.to_string(),
            extension: normalized.extension.to_string(),
            thumbnail: None,
            outcome: None,
        })
    }

    async fn process_video(
        &self,
        asset: MediaAsset,
        progress: Option<ProgressCallback>,
    ) -> Processed {
        let input = VideoInput {
            extension: derive_extension(asset.filename.as_deref(), &asset.content_type),
            data: asset.data,
            content_type: asset.content_type,
        };

        let result = self.engine.transcode(input, progress).await;

        Processed {
            data: result.data,
            content_type: result.content_type,
            extension: result.extension,
            thumbnail: result.thumbnail,
            outcome: Some(result.outcome),
        }
    }

    /// Best effort: a failed thumbnail put is logged and the URL omitted.
    async fn store_thumbnail(&self, folder: &str, thumbnail: NormalizedImage) -> Option<String> {
        let key = StorageKey::generate(folder, thumbnail.extension).to_string();

        match self
            .storage
            .put(&key, Vec::from(thumbnail.data), thumbnail.content_type)
            .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Failed to store video thumbnail");
                None
            }
        }
    }
}
