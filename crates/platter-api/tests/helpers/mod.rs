//! Test helpers: build AppState and router for integration tests.
//!
//! Storage is an in-memory recording backend and the transcoder is scripted, so these
//! tests need neither an object store nor an ffmpeg binary.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use platter_api::constants;
use platter_api::setup::routes;
use platter_api::state::AppState;
use platter_core::{BaseConfig, Config, IngestionConfig, StorageBackend};
use platter_processing::test_helpers::{
    EncodeScript, RecordingStorage, ScriptedProvider, ScriptedRuntime, ThumbnailScript,
};
use platter_processing::{EngineSettings, ImageNormalizer, IngestionPipeline, VideoEngine};
use std::sync::Arc;

pub const PUBLIC_BASE: &str = "https://media.example.com";

/// API path prefix for tests (e.g. `/api/v0/upload`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

pub fn upload_path() -> String {
    api_path(constants::UPLOAD_PATH)
}

pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<RecordingStorage>,
    pub runtime: Arc<ScriptedRuntime>,
    pub provider: Arc<ScriptedProvider>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

pub fn test_config() -> Config {
    Config::new(test_ingestion_config())
}

pub fn test_ingestion_config() -> IngestionConfig {
    IngestionConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["http://localhost:3000".to_string()],
            environment: "test".to_string(),
            log_format: "text".to_string(),
        },
        storage_backend: StorageBackend::Memory,
        s3_endpoint: None,
        s3_region: "auto".to_string(),
        s3_bucket: None,
        aws_access_key_id: None,
        aws_secret_access_key: None,
        public_base_url: PUBLIC_BASE.to_string(),
        local_storage_path: None,
        max_upload_size_bytes: 10 * 1024 * 1024,
        max_transcode_input_bytes: 1024 * 1024,
        ffmpeg_path: "ffmpeg".to_string(),
        max_concurrent_transcodes: 2,
        default_folder: "general".to_string(),
    }
}

/// App whose transcoder follows `encode` for every clip and `thumbnail` for frame grabs.
pub fn setup_test_app_with(encode: EncodeScript, thumbnail: ThumbnailScript) -> TestApp {
    setup_test_app_from(test_config(), encode, thumbnail)
}

pub fn setup_test_app_from(
    config: Config,
    encode: EncodeScript,
    thumbnail: ThumbnailScript,
) -> TestApp {
    let storage = Arc::new(RecordingStorage::new(PUBLIC_BASE));
    let runtime = Arc::new(ScriptedRuntime::new(encode, thumbnail));
    let provider = Arc::new(ScriptedProvider::new(runtime.clone()));

    let normalizer = ImageNormalizer::default();
    let engine = VideoEngine::new(
        provider.clone(),
        normalizer,
        EngineSettings {
            max_input_bytes: config.max_transcode_input_bytes(),
            max_concurrent_jobs: config.max_concurrent_transcodes(),
        },
    );
    let pipeline = IngestionPipeline::new(
        storage.clone(),
        normalizer,
        engine,
        config.default_folder(),
    );

    let state = Arc::new(AppState::new(config.clone(), pipeline));
    let router = routes::setup_routes(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        storage,
        runtime,
        provider,
    }
}

/// App with a transcoder that always fails; image and passthrough tests use this.
pub fn setup_test_app() -> TestApp {
    setup_test_app_with(EncodeScript::Fail, ThumbnailScript::Fail)
}

pub fn file_form(data: Vec<u8>, file_name: &str, mime: &str) -> MultipartForm {
    MultipartForm::new().add_part("file", Part::bytes(data).file_name(file_name).mime_type(mime))
}

/// True when `key` looks like `<folder>/<digits>-<6 base36 chars>.<ext>`.
pub fn key_matches(key: &str, folder: &str, ext: &str) -> bool {
    let Some(name) = key.strip_prefix(&format!("{}/", folder)) else {
        return false;
    };
    let Some(stem) = name.strip_suffix(&format!(".{}", ext)) else {
        return false;
    };
    let Some((millis, suffix)) = stem.split_once('-') else {
        return false;
    };
    !millis.is_empty()
        && millis.chars().all(|c| c.is_ascii_digit())
        && suffix.len() == 6
        && suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
}
