use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::media::TranscodeOutcome;

/// Response body for a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    /// Public URL of the stored object
    pub url: String,
    /// Storage key (`<folder>/<epoch-millis>-<suffix>.<ext>`)
    pub key: String,
    /// Stored size in bytes
    pub size: u64,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Present for video uploads only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TranscodeOutcome>,
}

/// Request body for deleting a previously uploaded object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeleteRequest {
    /// A URL previously returned by the upload endpoint
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}
