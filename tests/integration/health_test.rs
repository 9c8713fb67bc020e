//! Health endpoint tests.

use axum::http::StatusCode;

use crate::helpers::{TestApp, WRITE_IMAGE, render_form};

#[tokio::test]
async fn test_health() {
    let app = TestApp::new(WRITE_IMAGE);

    let response = app.get("/api/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_detailed_health_reports_slots_and_metrics() {
    let app = TestApp::with_config(WRITE_IMAGE, |config| {
        config.renderer.max_concurrent_renders = 3;
    });

    let response = app.post_form("/api/render", render_form()).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.get("/api/health/detailed").await;
    assert_eq!(response.status, StatusCode::OK);

    let data = &response.body["data"];
    assert_eq!(data["status"], "ok");
    assert_eq!(data["render_slots_total"], 3);
    assert_eq!(data["render_slots_available"], 3);
    assert_eq!(data["renderer_timeout_seconds"], 10);
    assert_eq!(data["metrics"]["renders_succeeded"], 1);
    assert_eq!(data["metrics"]["total_output_bytes"], 10);
}

#[tokio::test]
async fn test_detailed_health_degraded_without_renderer() {
    let app = TestApp::with_config(WRITE_IMAGE, |config| {
        config.renderer.program = "phyloplot-no-such-renderer".to_string();
    });

    let response = app.post_form("/api/render", render_form()).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);

    let response = app.get("/api/health/detailed").await;
    assert_eq!(response.body["data"]["status"], "degraded");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new(WRITE_IMAGE);

    let response = app.get("/api/nothing-here").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
