//! Configuration module
//!
//! Configuration is read once at process start from the environment (and an optional
//! `.env` file). Object-store credentials are read-only after load and shared freely.

use std::env;
use std::fmt;

use crate::constants::DEFAULT_FOLDER;
use crate::storage_types::StorageBackend;
use crate::validation::is_valid_folder;

const SERVER_PORT: u16 = 4000;
const MAX_UPLOAD_SIZE_MB: usize = 100;
const MAX_TRANSCODE_INPUT_MB: usize = 50;
const MAX_CONCURRENT_TRANSCODES: usize = 2;
const DEFAULT_S3_REGION: &str = "auto";

/// Process-level settings not tied to media handling
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// `text` or `json`
    pub log_format: String,
}

/// Ingestion service configuration
#[derive(Clone)]
pub struct IngestionConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (R2, MinIO, ...)
    pub s3_region: String,
    pub s3_bucket: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub public_base_url: String,
    pub local_storage_path: Option<String>,
    // Media processing configuration
    pub max_upload_size_bytes: usize,
    pub max_transcode_input_bytes: usize,
    pub ffmpeg_path: String,
    pub max_concurrent_transcodes: usize,
    pub default_folder: String,
}

impl fmt::Debug for IngestionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionConfig")
            .field("base", &self.base)
            .field("storage_backend", &self.storage_backend)
            .field("s3_endpoint", &self.s3_endpoint)
            .field("s3_region", &self.s3_region)
            .field("s3_bucket", &self.s3_bucket)
            .field(
                "aws_access_key_id",
                &self.aws_access_key_id.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "aws_secret_access_key",
                &self.aws_secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("public_base_url", &self.public_base_url)
            .field("local_storage_path", &self.local_storage_path)
            .field("max_upload_size_bytes", &self.max_upload_size_bytes)
            .field("max_transcode_input_bytes", &self.max_transcode_input_bytes)
            .field("ffmpeg_path", &self.ffmpeg_path)
            .field("max_concurrent_transcodes", &self.max_concurrent_transcodes)
            .field("default_folder", &self.default_folder)
            .finish()
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<IngestionConfig>);

impl Config {
    pub fn new(config: IngestionConfig) -> Self {
        Config(Box::new(config))
    }

    fn inner(&self) -> &IngestionConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = IngestionConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.inner().base.environment)
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn s3_region(&self) -> &str {
        &self.inner().s3_region
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn aws_access_key_id(&self) -> Option<&str> {
        self.inner().aws_access_key_id.as_deref()
    }

    pub fn aws_secret_access_key(&self) -> Option<&str> {
        self.inner().aws_secret_access_key.as_deref()
    }

    pub fn public_base_url(&self) -> &str {
        &self.inner().public_base_url
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().max_upload_size_bytes
    }

    pub fn max_transcode_input_bytes(&self) -> usize {
        self.inner().max_transcode_input_bytes
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.inner().ffmpeg_path
    }

    pub fn max_concurrent_transcodes(&self) -> usize {
        self.inner().max_concurrent_transcodes
    }

    pub fn default_folder(&self) -> &str {
        &self.inner().default_folder
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a size in MiB and convert it to bytes, rejecting values that overflow.
fn mib_to_bytes(key: &str, default_mb: usize) -> Result<usize, anyhow::Error> {
    env_or(key, default_mb)
        .checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("{} is too large", key))
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl IngestionConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "text".to_string())
                .to_lowercase(),
        };

        let storage_backend = match non_empty("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let public_base_url = non_empty("PUBLIC_MEDIA_BASE_URL")
            .ok_or_else(|| anyhow::anyhow!("PUBLIC_MEDIA_BASE_URL must be set"))?;

        let config = IngestionConfig {
            base,
            storage_backend,
            s3_endpoint: non_empty("S3_ENDPOINT"),
            s3_region: non_empty("S3_REGION")
                .or_else(|| non_empty("AWS_REGION"))
                .unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
            s3_bucket: non_empty("S3_BUCKET"),
            aws_access_key_id: non_empty("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: non_empty("AWS_SECRET_ACCESS_KEY"),
            public_base_url,
            local_storage_path: non_empty("LOCAL_STORAGE_PATH"),
            max_upload_size_bytes: mib_to_bytes("MAX_UPLOAD_SIZE_MB", MAX_UPLOAD_SIZE_MB)?,
            max_transcode_input_bytes: mib_to_bytes(
                "MAX_TRANSCODE_INPUT_MB",
                MAX_TRANSCODE_INPUT_MB,
            )?,
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            max_concurrent_transcodes: env_or(
                "MAX_CONCURRENT_TRANSCODES",
                MAX_CONCURRENT_TRANSCODES,
            ),
            default_folder: non_empty("DEFAULT_FOLDER")
                .unwrap_or_else(|| DEFAULT_FOLDER.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.public_base_url.starts_with("http://")
            || self.public_base_url.starts_with("https://"))
        {
            return Err(anyhow::anyhow!(
                "PUBLIC_MEDIA_BASE_URL must be an http(s) URL"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 if self.s3_bucket.is_none() => {
                return Err(anyhow::anyhow!(
                    "S3_BUCKET must be set when STORAGE_BACKEND=s3"
                ));
            }
            StorageBackend::Local if self.local_storage_path.is_none() => {
                return Err(anyhow::anyhow!(
                    "LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local"
                ));
            }
            _ => {}
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        if self.max_concurrent_transcodes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_CONCURRENT_TRANSCODES must be greater than 0"
            ));
        }

        if self.ffmpeg_path.trim().is_empty() {
            return Err(anyhow::anyhow!("FFMPEG_PATH must not be empty"));
        }

        if !is_valid_folder(&self.default_folder) {
            return Err(anyhow::anyhow!(
                "DEFAULT_FOLDER '{}' is invalid: use 1-64 characters of letters, digits, '_', '-' and '/'",
                self.default_folder
            ));
        }

        Ok(())
    }
}
