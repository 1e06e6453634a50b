use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    response::IntoResponse,
    Json,
};
use platter_core::models::UploadResponse;
use platter_core::AppError;
use platter_processing::{MediaAsset, ProgressCallback};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use utoipa::ToSchema;

/// Multipart body accepted by the upload endpoint (documentation only)
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// The media file
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    /// Classification folder, e.g. `products` (default `general`)
    folder: Option<String>,
}

struct ParsedUpload {
    asset: MediaAsset,
    folder: Option<String>,
}

/// Read the `file` part (exactly one) and the optional `folder` text part.
async fn extract_upload(mut multipart: Multipart) -> Result<ParsedUpload, HttpAppError> {
    let mut asset: Option<MediaAsset> = None;
    let mut folder: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        match field_name.as_str() {
            "file" => {
                if asset.is_some() {
                    return Err(AppError::InvalidInput(
                        "Multiple file fields are not allowed; send exactly one field named 'file'"
                            .to_string(),
                    )
                    .into());
                }
                let filename = field.file_name().map(|s: &str| s.to_string());
                let content_type = field
                    .content_type()
                    .map(|s: &str| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field.bytes().await?;

                asset = Some(MediaAsset {
                    data,
                    content_type,
                    filename,
                });
            }
            "folder" => {
                folder = Some(field.text().await?);
            }
            _ => {}
        }
    }

    let asset = asset.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;
    Ok(ParsedUpload { asset, folder })
}

/// Logs transcode progress at 25% milestones.
fn progress_logger() -> ProgressCallback {
    let last_milestone = Arc::new(AtomicU8::new(0));
    Arc::new(move |percent: u8| {
        let milestone = percent / 25;
        if milestone > last_milestone.fetch_max(milestone, Ordering::Relaxed) {
            tracing::debug!(percent, "Transcode progress");
        }
    })
}

#[utoipa::path(
    post,
    path = "/api/v0/upload",
    tag = "media",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Media stored", body = UploadResponse),
        (status = 400, description = "Missing file or invalid folder", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 500, description = "Image could not be processed or storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_media"))]
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let ParsedUpload { asset, folder } = extract_upload(multipart?).await?;

    tracing::debug!(
        content_type = %asset.content_type,
        filename = ?asset.filename,
        size_bytes = asset.data.len(),
        folder = ?folder,
        "Upload received"
    );

    let stored = state
        .pipeline
        .ingest(asset, folder.as_deref(), Some(progress_logger()))
        .await?;

    Ok(Json(UploadResponse {
        success: true,
        url: stored.url,
        key: stored.key,
        size: stored.size,
        content_type: stored.content_type,
        thumbnail_url: stored.thumbnail_url,
        outcome: stored.outcome,
    }))
}
