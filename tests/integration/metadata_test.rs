//! Metadata inspection endpoint tests.

use axum::http::StatusCode;

use crate::helpers::{METADATA, MultipartForm, TestApp, WRITE_IMAGE};

#[tokio::test]
async fn test_inspect_lists_columns() {
    let app = TestApp::new(WRITE_IMAGE);

    let form = MultipartForm::new().file("metadata_file", "metadata.tsv", METADATA.as_bytes());
    let response = app.post_form("/api/metadata/inspect", form).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(
        response.body["data"]["columns"],
        serde_json::json!(["id", "country", "clade"])
    );
    assert_eq!(response.body["data"]["row_count"], 5);
    assert!(response.body["data"].get("values").is_none_or(|v| v.is_null()));
}

#[tokio::test]
async fn test_inspect_column_values_skip_missing() {
    let app = TestApp::new(WRITE_IMAGE);

    let form = MultipartForm::new()
        .file("metadata_file", "metadata.tsv", METADATA.as_bytes())
        .text("column", "country");
    let response = app.post_form("/api/metadata/inspect", form).await;

    assert_eq!(response.status, StatusCode::OK);
    let values = response.body["data"]["values"]
        .as_array()
        .expect("values")
        .clone();
    assert_eq!(values.len(), 3);
    assert!(!values.contains(&serde_json::json!("NA")));
}

#[tokio::test]
async fn test_inspect_unknown_column() {
    let app = TestApp::new(WRITE_IMAGE);

    let form = MultipartForm::new()
        .file("metadata_file", "metadata.tsv", METADATA.as_bytes())
        .text("column", "host");
    let response = app.post_form("/api/metadata/inspect", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
