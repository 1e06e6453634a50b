use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Active storage backend (`s3`, `local`, `memory`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_backend: Option<String>,
    /// Whether the transcoding runtime has been loaded yet. It loads on first video upload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcoder_loaded: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses((status = 200, description = "Process is alive", body = HealthResponse))
)]
pub async fn liveness() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        storage_backend: None,
        transcoder_loaded: None,
    })
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses((status = 200, description = "Ready to accept uploads", body = HealthResponse))
)]
pub async fn readiness(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ready".to_string(),
        storage_backend: Some(state.storage().backend_type().to_string()),
        transcoder_loaded: Some(state.pipeline.engine().is_runtime_loaded()),
    })
}
