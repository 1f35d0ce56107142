//! HTTP routes and shared request state.

mod detection;
mod error;
mod health;
mod modification;
mod upload;

pub use error::ApiError;

use crate::config::Settings;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use deck_core::ContentRewriter;
use deck_detector::DetectorRegistry;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

/// Multipart overhead allowed on top of the upload cap, for the form fields.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// State shared by every handler.
pub struct AppState {
    pub settings: Settings,
    pub detectors: Arc<DetectorRegistry>,
    pub rewriter: ContentRewriter,
}

impl AppState {
    pub fn new(settings: Settings, detectors: Arc<DetectorRegistry>) -> Self {
        Self {
            settings,
            detectors,
            rewriter: ContentRewriter::new(),
        }
    }

    /// State backed by ONNX models from the configured cache and hub.
    pub fn from_settings(settings: Settings) -> Self {
        let registry = Arc::new(settings.detector_registry());
        Self::new(settings, registry)
    }
}

/// The full application router.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.settings.max_upload_size_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD_BYTES);
    let cors = cors_layer(&state.settings.cors_origins_list());

    Router::new()
        .route("/", get(health::root))
        .route("/api/health", get(health::health_check))
        .route("/api/detect/text", post(detection::detect_text))
        .route("/api/detect/pptx", post(detection::detect_pptx))
        .route("/api/modify/pptx", post(modification::modify_pptx))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// Current UTC time as ISO 8601 with a `Z` suffix.
pub fn utc_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Run synchronous document/model work off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("Worker task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use deck_core::Result;
    use deck_detector::{ClassifierLoader, SequenceClassifier};
    use deck_pptx::fixtures::{DeckBuilder, SlideBuilder};
    use deck_pptx::PptxReader;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const BOUNDARY: &str = "deck-test-boundary";

    /// "utilize" reads as AI-written; everything else as human.
    struct KeywordClassifier;

    impl SequenceClassifier for KeywordClassifier {
        fn ai_probability(&self, text: &str) -> Result<f64> {
            Ok(if text.contains("utilize") { 0.9 } else { 0.2 })
        }
    }

    struct StubLoader {
        loads: Arc<AtomicUsize>,
    }

    impl ClassifierLoader for StubLoader {
        fn load(&self, _model_id: &str) -> Result<Box<dyn SequenceClassifier>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(KeywordClassifier))
        }

        fn is_available(&self, _model_id: &str) -> bool {
            true
        }
    }

    struct TestApp {
        router: Router,
        loads: Arc<AtomicUsize>,
        temp: tempfile::TempDir,
    }

    impl TestApp {
        /// Files left behind in the configured temp directory.
        fn leftover_temp_files(&self) -> usize {
            std::fs::read_dir(self.temp.path()).unwrap().count()
        }
    }

    fn app() -> TestApp {
        let temp = tempfile::tempdir().unwrap();
        let settings = Settings {
            temp_dir: temp.path().to_path_buf(),
            ..Default::default()
        };
        let loads = Arc::new(AtomicUsize::new(0));
        let loader = StubLoader {
            loads: Arc::clone(&loads),
        };
        let registry = DetectorRegistry::new(loader, "stub-model");
        let state = Arc::new(AppState::new(settings, Arc::new(registry)));

        TestApp {
            router: router(state),
            loads,
            temp,
        }
    }

    enum Part<'a> {
        File(&'a str, &'a [u8]),
        Text(&'a str, &'a str),
    }

    fn multipart(parts: &[Part]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::File(name, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n",
                            name
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}", name, value)
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn multipart_request(uri: &str, parts: &[Part]) -> Request<Body> {
        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart(parts)))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn deck() -> Vec<u8> {
        DeckBuilder::new()
            .slide(SlideBuilder::new().text_box("Teams utilize dashboards in order to track progress."))
            .slide(SlideBuilder::new())
            .slide(SlideBuilder::new().text_box("Lunch is at noon."))
            .build()
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let app = app();

        let response = app
            .router
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["health"], "/api/health");

        let response = app
            .router
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["models_loaded"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
        // Health never loads a model
        assert_eq!(app.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_detect_text() {
        let app = app();
        let request = Request::post("/api/detect/text")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text": "We utilize many tools every day."}"#))
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["is_ai_generated"], true);
        assert_eq!(body["label"], "AI");
        assert_eq!(body["model_name"], "stub-model");
    }

    #[tokio::test]
    async fn test_detect_text_too_short() {
        let app = app();
        let request = Request::post("/api/detect/text")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text": "tiny"}"#))
            .unwrap();

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["error_type"], "ValidationError");
        assert_eq!(body["detail"], "Text must be at least 10 characters long");
        assert_eq!(app.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_detect_pptx() {
        let app = app();
        let data = deck();
        let request = multipart_request("/api/detect/pptx", &[Part::File("talk.pptx", &data)]);

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["file_name"], "talk.pptx");
        assert_eq!(body["total_slides"], 3);
        assert_eq!(body["ai_slides"], 1);
        assert_eq!(body["human_slides"], 2);
        assert_eq!(body["slides"][1]["text"], "");
        assert_eq!(body["slides"][1]["detection"]["confidence"], 0.0);
    }

    #[tokio::test]
    async fn test_disallowed_extension_rejected_before_parsing() {
        let app = app();
        let request = multipart_request(
            "/api/detect/pptx",
            &[Part::File("notes.txt", b"definitely not a zip archive")],
        );

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["error_type"], "ValidationError");
        assert!(body["detail"].as_str().unwrap().contains(".txt"));
        assert_eq!(app.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_file_field() {
        let app = app();
        let request = multipart_request("/api/detect/pptx", &[Part::Text("other", "x")]);

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_corrupt_pptx_is_server_error() {
        let app = app();
        let request = multipart_request("/api/detect/pptx", &[Part::File("broken.pptx", b"not a zip")]);

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error_type"], "UnsupportedFormat");
        assert_eq!(app.leftover_temp_files(), 0);
    }

    #[tokio::test]
    async fn test_failed_modify_removes_temp_files() {
        let app = app();
        let request = multipart_request("/api/modify/pptx", &[Part::File("broken.pptx", b"not a zip")]);

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app.leftover_temp_files(), 0);
    }

    #[tokio::test]
    async fn test_modify_pptx_returns_attachment() {
        let app = app();
        let data = deck();
        let request = multipart_request(
            "/api/modify/pptx",
            &[
                Part::File("talk.pptx", &data),
                Part::Text("font_name", "Arial"),
                Part::Text("text_color", "#112233"),
                Part::Text("confidence_threshold", "0.5"),
            ],
        );

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        // Both the uploaded input and the modified output are gone
        assert_eq!(app.leftover_temp_files(), 0);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"modified_talk.pptx\""
        );
        assert_eq!(response.headers()[header::CONTENT_TYPE], modification::PPTX_MIME);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let slides = PptxReader::new().read(Cursor::new(bytes.to_vec())).unwrap();
        assert_eq!(slides[0].text, "Teams use dashboards to track progress.");
        assert_eq!(slides[2].text, "Lunch is at noon.");
    }

    #[tokio::test]
    async fn test_modify_without_replacement_skips_model() {
        let app = app();
        let data = deck();
        let request = multipart_request(
            "/api/modify/pptx",
            &[
                Part::File("talk.pptx", &data),
                Part::Text("replace_ai_content", "false"),
                Part::Text("font_name", "Arial"),
            ],
        );

        let response = app.router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(app.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_modify_rejects_bad_form_values() {
        let data = deck();
        for (name, value) in [
            ("text_color", "blue"),
            ("confidence_threshold", "1.5"),
            ("replace_ai_content", "maybe"),
        ] {
            let app = app();
            let request = multipart_request(
                "/api/modify/pptx",
                &[Part::File("talk.pptx", &data), Part::Text(name, value)],
            );

            let response = app.router.oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{name}={value}");
        }
    }
}
