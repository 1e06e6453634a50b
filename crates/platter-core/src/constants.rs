//! Processing and storage constants shared across crates.

/// Folder used when an upload does not name one.
pub const DEFAULT_FOLDER: &str = "general";

/// Maximum folder tag length accepted by the key allocator.
pub const MAX_FOLDER_LEN: usize = 64;

/// Length of the random base36 suffix in storage keys.
pub const KEY_SUFFIX_LEN: usize = 6;

/// Bounding box (both axes) for normalized images.
pub const IMAGE_MAX_DIMENSION: u32 = 800;

/// Lossy quality factor for the canonical raster codec.
pub const IMAGE_QUALITY: f32 = 80.0;

/// Canonical raster codec for normalized images and video thumbnails.
pub const IMAGE_CONTENT_TYPE: &str = "image/webp";
pub const IMAGE_EXTENSION: &str = "webp";

/// Maximum width of transcoded video.
pub const VIDEO_MAX_WIDTH: u32 = 480;

/// Constant rate factor for the video encoder (higher is smaller).
pub const VIDEO_CRF: u8 = 32;

/// Audio bitrate for transcoded video, in kbit/s.
pub const VIDEO_AUDIO_BITRATE_KBPS: u32 = 64;

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";
pub const VIDEO_EXTENSION: &str = "mp4";

/// Extension used when neither the filename nor the content type yield one.
pub const FALLBACK_EXTENSION: &str = "bin";
