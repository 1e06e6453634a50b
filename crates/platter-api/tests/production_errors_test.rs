//! Error rendering under a production configuration.
//!
//! Kept in its own test binary: the detail-hiding switch is process-wide.

mod helpers;

use helpers::{setup_test_app_from, test_ingestion_config, upload_path};
use platter_core::Config;
use platter_processing::test_helpers::{EncodeScript, ThumbnailScript};
use serde_json::{json, Value};

#[tokio::test]
async fn test_production_config_hides_error_details() {
    let mut config = test_ingestion_config();
    config.base.environment = "production".to_string();
    let app = setup_test_app_from(Config::new(config), EncodeScript::Fail, ThumbnailScript::Fail);

    let response = app.client().delete(&upload_path()).json(&json!({})).await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(body["error"], "No URL provided");
    assert!(body.get("details").is_none());
    assert!(body.get("error_type").is_none());
}
