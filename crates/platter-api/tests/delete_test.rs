//! Delete endpoint integration tests.
//!
//! Run with: `cargo test -p platter-api --test delete_test`

mod helpers;

use helpers::{file_form, setup_test_app, upload_path, PUBLIC_BASE};
use platter_core::models::{DeleteResponse, UploadResponse};
use platter_storage::Storage;
use serde_json::{json, Value};

async fn upload_text(app: &helpers::TestApp) -> UploadResponse {
    let form = file_form(b"delete me".to_vec(), "note.txt", "text/plain")
        .add_text("folder", "products");
    let response = app.client().post(&upload_path()).multipart(form).await;
    assert_eq!(response.status_code(), 200);
    response.json()
}

#[tokio::test]
async fn test_delete_uploaded_media() {
    let app = setup_test_app();
    let uploaded = upload_text(&app).await;
    assert!(app.storage.exists(&uploaded.key).await.unwrap());

    let response = app
        .client()
        .delete(&upload_path())
        .json(&json!({ "url": uploaded.url }))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: DeleteResponse = response.json();
    assert!(body.success);
    assert!(!app.storage.exists(&uploaded.key).await.unwrap());
}

#[tokio::test]
async fn test_delete_twice_returns_404() {
    let app = setup_test_app();
    let uploaded = upload_text(&app).await;

    let first = app
        .client()
        .delete(&upload_path())
        .json(&json!({ "url": uploaded.url }))
        .await;
    assert_eq!(first.status_code(), 200);

    let second = app
        .client()
        .delete(&upload_path())
        .json(&json!({ "url": uploaded.url }))
        .await;
    assert_eq!(second.status_code(), 404);
    let body: Value = second.json();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_delete_unknown_key_under_our_base_returns_404() {
    let app = setup_test_app();

    let response = app
        .client()
        .delete(&upload_path())
        .json(&json!({ "url": format!("{}/general/1700000000000-abcdef.webp", PUBLIC_BASE) }))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_delete_foreign_url_never_reaches_storage() {
    let app = setup_test_app();

    let response = app
        .client()
        .delete(&upload_path())
        .json(&json!({ "url": "https://cdn.other-service.net/products/1-abcdef.webp" }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "BAD_REQUEST");
    assert_eq!(app.storage.call_count(), 0);
}

#[tokio::test]
async fn test_delete_missing_url_returns_400() {
    let app = setup_test_app();

    let response = app.client().delete(&upload_path()).json(&json!({})).await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
    assert_eq!(app.storage.call_count(), 0);
}

#[tokio::test]
async fn test_delete_malformed_body_returns_400() {
    let app = setup_test_app();

    let response = app
        .client()
        .delete(&upload_path())
        .bytes("{ not json".into())
        .content_type("application/json")
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}
