//! Shared test helpers for integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use phyloplot_core::config::AppConfig;
use phyloplot_render::{RenderPipeline, SessionWorkspace};

pub const METADATA: &str = "id\tcountry\tclade\n\
    s1\tKenya\tA\n\
    s2\tUganda\tA\n\
    s3\tKenya\tB\n\
    s4\tTanzania\tB\n\
    s5\tNA\tC\n";

pub const TREE: &str = "((s1:0.1,s2:0.2):0.3,(s3:0.1,s4:0.2):0.3,s5:0.5);";

/// Writes a fake image to its ninth argument.
pub const WRITE_IMAGE: &str = "#!/bin/sh\nprintf 'FAKE-IMAGE' > \"$9\"\n";

/// Writes about 20 KiB of highly compressible bytes to its ninth argument.
pub const WRITE_LARGE: &str = "#!/bin/sh\nyes ARTIFACT | head -n 2000 > \"$9\"\n";

/// Fails with a diagnostic on stderr.
pub const FAIL: &str = "#!/bin/sh\necho 'Error in read.tree: cannot parse' >&2\nexit 1\n";

/// Never finishes on its own.
pub const HANG: &str = "#!/bin/sh\nsleep 30\n";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// The pipeline behind the router
    pub pipeline: Arc<RenderPipeline>,
    /// Holds the stub renderer and the session root
    pub dir: TempDir,
}

impl TestApp {
    /// Create an app whose renderer runs `script`.
    pub fn new(script: &str) -> Self {
        Self::with_config(script, |_| {})
    }

    /// Create an app whose renderer runs `script`, adjusting the config.
    pub fn with_config(script: &str, adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let script_path = dir.path().join("renderer.sh");
        std::fs::write(&script_path, script).expect("write stub renderer");

        let mut config = AppConfig::default();
        config.renderer.program = "sh".to_string();
        config.renderer.leading_args = vec![script_path.to_string_lossy().into_owned()];
        config.renderer.timeout_seconds = 10;
        config.workspace.root = Some(dir.path().join("sessions"));
        adjust(&mut config);

        let workspace =
            SessionWorkspace::new(config.workspace.effective_root()).expect("workspace");
        let pipeline = Arc::new(RenderPipeline::with_workspace(&config.renderer, workspace));
        let state = phyloplot_api::AppState::new(config, Arc::clone(&pipeline));
        let router = phyloplot_api::build_app(state);

        Self {
            router,
            pipeline,
            dir,
        }
    }

    /// Session root of the pipeline.
    pub fn sessions(&self) -> PathBuf {
        self.pipeline.workspace().root().to_path_buf()
    }

    /// Number of entries left in the session root.
    pub fn leftover_sessions(&self) -> usize {
        std::fs::read_dir(self.sessions())
            .expect("read sessions")
            .count()
    }

    /// Send a GET request.
    pub async fn get(&self, path: &str) -> TestResponse {
        let req = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(req).await
    }

    /// Send a multipart POST request.
    pub async fn post_form(&self, path: &str, form: MultipartForm) -> TestResponse {
        self.post_form_with(path, form, &[]).await
    }

    /// Send a multipart POST request with extra headers.
    pub async fn post_form_with(
        &self,
        path: &str,
        form: MultipartForm,
        headers: &[(header::HeaderName, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, form.content_type());
        for (name, value) in headers {
            builder = builder.header(name, *value);
        }
        let req = builder
            .body(Body::from(form.finish()))
            .expect("Failed to build request");
        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024 * 1024)
            .await
            .expect("Failed to read body")
            .to_vec();
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Raw body
    pub bytes: Vec<u8>,
    /// Body parsed as JSON (`Null` when it is not JSON)
    pub body: Value,
}

impl TestResponse {
    /// A header value as text.
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Minimal `multipart/form-data` body builder.
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: "phyloplot-test-boundary-7d1f".to_string(),
            body: Vec::new(),
        }
    }

    /// Add a text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    /// Add a file field.
    pub fn file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}

/// The reference render form: marker clade, highlight country = Kenya,
/// label id, sizes 5/5, png.
pub fn render_form() -> MultipartForm {
    MultipartForm::new()
        .file("metadata_file", "metadata.tsv", METADATA.as_bytes())
        .file("tree_file", "tree.nwk", TREE.as_bytes())
        .text("marker_column", "clade")
        .text("highlight_column", "country")
        .text("highlight_values", "Kenya")
        .text("label_column", "id")
        .text("label_size", "5")
        .text("tip_size", "5")
        .text("output_format", "png")
}
