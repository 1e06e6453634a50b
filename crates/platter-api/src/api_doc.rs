//! OpenAPI documentation.

use axum::Json;
use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use platter_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Platter Media API",
        version = "0.1.0",
        description = "Media ingestion API (v0). Images are normalized to WebP, short videos are transcoded to compact MP4 with a WebP thumbnail, everything else is stored as uploaded."
    ),
    paths(
        handlers::upload::upload_media,
        handlers::delete::delete_media,
        handlers::health::liveness,
        handlers::health::readiness,
    ),
    components(schemas(
        models::UploadResponse,
        models::DeleteRequest,
        models::DeleteResponse,
        models::TranscodeOutcome,
        handlers::upload::UploadForm,
        handlers::health::HealthResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "media", description = "Upload and delete media"),
        (name = "health", description = "Liveness and readiness checks")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
