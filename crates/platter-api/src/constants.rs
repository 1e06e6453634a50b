//! API constants

/// Versioned prefix for all media routes
pub const API_PREFIX: &str = "/api/v0";

/// Upload (POST) and delete (DELETE) share one path under [`API_PREFIX`]
pub const UPLOAD_PATH: &str = "/upload";

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";

pub const HEALTH_LIVE_PATH: &str = "/health/live";
pub const HEALTH_READY_PATH: &str = "/health/ready";
