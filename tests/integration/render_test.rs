//! Render endpoint tests.

use axum::http::{StatusCode, header};

use crate::helpers::{
    FAIL, HANG, METADATA, MultipartForm, TREE, TestApp, WRITE_IMAGE, WRITE_LARGE, render_form,
};

#[tokio::test]
async fn test_render_returns_image_attachment() {
    let app = TestApp::new(WRITE_IMAGE);

    let response = app.post_form("/api/render", render_form()).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), Some("image/png"));
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        Some("attachment; filename=\"phylogenetic_tree.png\"")
    );
    assert_eq!(response.bytes, b"FAKE-IMAGE");
    assert!(response.headers.contains_key("x-request-id"));
    assert_eq!(app.leftover_sessions(), 0);
}

#[tokio::test]
async fn test_render_svg_sets_mime_type() {
    let app = TestApp::new(WRITE_IMAGE);

    let form = MultipartForm::new()
        .file("metadata_file", "metadata.tsv", METADATA.as_bytes())
        .file("tree_file", "tree.nwk", TREE.as_bytes())
        .text("marker_column", "clade")
        .text("highlight_column", "none")
        .text("label_column", "id")
        .text("label_size", "3")
        .text("tip_size", "2")
        .text("output_format", "svg");
    let response = app.post_form("/api/render", form).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_TYPE), Some("image/svg+xml"));
}

#[tokio::test]
async fn test_unknown_column_is_bad_request() {
    let app = TestApp::new(WRITE_IMAGE);

    let form = render_form().text("marker_column", "lineage");
    // Later fields overwrite earlier ones in the form.
    let response = app.post_form("/api/render", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
    assert!(
        response.body["message"]
            .as_str()
            .is_some_and(|m| m.contains("lineage"))
    );
    assert_eq!(app.leftover_sessions(), 0);
    assert_eq!(app.pipeline.metrics_snapshot().renders_started, 0);
}

#[tokio::test]
async fn test_missing_tree_file_is_bad_request() {
    let app = TestApp::new(WRITE_IMAGE);

    let form = MultipartForm::new()
        .file("metadata_file", "metadata.tsv", METADATA.as_bytes())
        .text("marker_column", "clade")
        .text("label_column", "id")
        .text("output_format", "png");
    let response = app.post_form("/api/render", form).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_renderer_failure_is_unprocessable() {
    let app = TestApp::new(FAIL);

    let response = app.post_form("/api/render", render_form()).await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"], "RENDERING_FAILED");
    assert!(
        response.body["message"]
            .as_str()
            .is_some_and(|m| m.contains("read.tree"))
    );
    assert_eq!(app.leftover_sessions(), 0);
}

#[tokio::test]
async fn test_missing_renderer_is_service_unavailable() {
    let app = TestApp::with_config(WRITE_IMAGE, |config| {
        config.renderer.program = "phyloplot-no-such-renderer".to_string();
    });

    let response = app.post_form("/api/render", render_form()).await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["error"], "RENDERER_UNAVAILABLE");
    assert_eq!(app.leftover_sessions(), 0);
}

#[tokio::test]
async fn test_hanging_renderer_times_out() {
    let app = TestApp::with_config(HANG, |config| {
        config.renderer.timeout_seconds = 1;
    });

    let response = app.post_form("/api/render", render_form()).await;

    assert_eq!(response.status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(response.body["error"], "RENDER_TIMEOUT");
    assert_eq!(app.leftover_sessions(), 0);
}

fn form_with_format(format: &str) -> MultipartForm {
    MultipartForm::new()
        .file("metadata_file", "metadata.tsv", METADATA.as_bytes())
        .file("tree_file", "tree.nwk", TREE.as_bytes())
        .text("marker_column", "clade")
        .text("label_column", "id")
        .text("output_format", format)
}

#[tokio::test]
async fn test_binary_artifacts_are_not_gzipped() {
    let app = TestApp::new(WRITE_LARGE);

    for format in ["pdf", "png", "tiff"] {
        let response = app
            .post_form_with(
                "/api/render",
                form_with_format(format),
                &[(header::ACCEPT_ENCODING, "gzip")],
            )
            .await;

        assert_eq!(response.status, StatusCode::OK, "{format}");
        assert!(
            response.header(header::CONTENT_ENCODING).is_none(),
            "{format} was compressed"
        );
        assert_eq!(response.bytes.len(), 2000 * "ARTIFACT\n".len());
    }
}

#[tokio::test]
async fn test_svg_artifacts_are_gzipped() {
    let app = TestApp::new(WRITE_LARGE);

    let response = app
        .post_form_with(
            "/api/render",
            form_with_format("svg"),
            &[(header::ACCEPT_ENCODING, "gzip")],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header(header::CONTENT_ENCODING), Some("gzip"));
}
