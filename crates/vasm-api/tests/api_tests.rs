//! HTTP-level tests against the in-memory store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use vasm_api::{create_router, ApiConfig, AppState};
use vasm_pipeline::PipelineConfig;
use vasm_storage::MemoryStore;

const MISSING_BINARY: &str = "/nonexistent/vasm-test-engine";

struct TestApp {
    _root: TempDir,
    store: Arc<MemoryStore>,
    router: Router,
}

fn app() -> TestApp {
    let root = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    let pipeline_config = PipelineConfig::default()
        .with_binaries(MISSING_BINARY, MISSING_BINARY)
        .with_work_dir(root.path().join("work"));
    let state = AppState::with_store(ApiConfig::default(), store.clone(), pipeline_config);

    TestApp {
        _root: root,
        store,
        router: create_router(state, None),
    }
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_is_live() {
    let app = app();
    let response = app.router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_empty_slideshow_request_is_invalid_plan() {
    let app = app();
    let response = app
        .router
        .oneshot(post_json("/criar-video", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["kind"], "invalid_plan");
    assert!(body["erro"].as_str().unwrap().contains("images_list"));
    assert_eq!(app.store.download_count(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app();
    let response = app
        .router
        .oneshot(post_json("/legendar-video", "{not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["kind"], "invalid_request");
    assert!(body["erro"].is_string());
}

#[tokio::test]
async fn test_missing_subtitle_names_the_key() {
    let app = app();
    app.store.put("in", "clip.mp4", b"not really a video".to_vec());

    let response = app
        .router
        .oneshot(post_json(
            "/legendar-video",
            r#"{"bucket_in":"in","video_key":"clip.mp4","subtitle_key":"subs.ass","bucket_out":"out"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert_eq!(body["kind"], "missing_artifact");
    assert_eq!(body["bucket"], "in");
    assert_eq!(body["key"], "subs.ass");
    assert!(body.get("index").is_none());
    assert!(app.store.keys("out").is_empty());
}

#[tokio::test]
async fn test_missing_image_reports_index() {
    let app = app();
    app.store.put("in", "voice.mp3", b"audio".to_vec());
    app.store.put("in", "a.jpg", b"image".to_vec());

    let response = app
        .router
        .oneshot(post_json(
            "/criar-video",
            r#"{"bucket_in":"in","audio_key":"voice.mp3","images_list":["a.jpg","b.jpg"],"bucket_out":"out"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert_eq!(body["key"], "b.jpg");
    assert_eq!(body["index"], 1);
}

#[tokio::test]
async fn test_out_of_range_volume_rejected() {
    let app = app();
    let response = app
        .router
        .oneshot(post_json(
            "/mixar-audio",
            r#"{"bucket_in":"in","video_key":"v.mp4","music_list":["m.mp3"],"volume":3.0,"bucket_out":"out"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["kind"], "invalid_plan");
}

#[tokio::test]
async fn test_analyze_requires_a_source() {
    let app = app();
    let response = app
        .router
        .oneshot(post_json("/analyze", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["kind"], "invalid_plan");
}

#[tokio::test]
async fn test_ready_reports_missing_engine() {
    let app = app();
    let response = app.router.oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(response).await;
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["checks"]["storage"]["status"], "ok");
    assert_eq!(body["checks"]["encoder"]["status"], "error");
    assert_eq!(body["checks"]["prober"]["status"], "error");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = app();
    let request = Request::builder()
        .uri("/healthz")
        .header("X-Request-ID", "req-42")
        .body(Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let app = app();
    let response = app.router.oneshot(get("/health")).await.unwrap();
    let id = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(id.len(), 36);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = app();
    let response = app.router.oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
