use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use platter_core::models::{DeleteRequest, DeleteResponse};
use std::sync::Arc;

#[utoipa::path(
    delete,
    path = "/api/v0/upload",
    tag = "media",
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "Media deleted", body = DeleteResponse),
        (status = 400, description = "Missing URL or URL not issued by this service", body = ErrorResponse),
        (status = 404, description = "No object at that URL", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all, fields(operation = "delete_media"))]
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<DeleteRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let key = state.pipeline.remove(request.url.as_deref()).await?;
    tracing::debug!(key = %key, "Delete request completed");

    Ok(Json(DeleteResponse { success: true }))
}
