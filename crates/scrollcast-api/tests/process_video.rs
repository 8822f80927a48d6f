//! HTTP tests for the process-video endpoint, driven through the full router
//! with the pipeline's stage fakes.

use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use scrollcast_api::{create_router, ApiConfig, AppState, ToolPaths};
use scrollcast_pipeline::testing::{
    fake_pipeline, looks_like_mp4, FailingStage, FakeCapture, FakeCompositor, FakeMasker,
};
use scrollcast_pipeline::{PipelineConfig, VideoPipeline};

const BOUNDARY: &str = "scrollcast-test-boundary";

enum Part<'a> {
    File(&'a str, &'a [u8]),
    Text(&'a str, &'a str),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File(name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"clip.webm\"\r\n\
                         Content-Type: video/webm\r\n\r\n",
                        name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                        name, value
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/process-video")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn router_with(pipeline: VideoPipeline, config: ApiConfig) -> Router {
    create_router(AppState::new(config, pipeline, ToolPaths::default()), None)
}

fn router(work_root: &Path) -> Router {
    router_with(fake_pipeline(work_root), ApiConfig::default())
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_process_video_returns_mp4() {
    let root = TempDir::new().unwrap();
    let response = router(root.path())
        .oneshot(upload(&[
            Part::File("talkingHeadVideo", b"webm-bytes"),
            Part::Text("websiteUrl", "https://example.com"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"processed-video.mp4\""
    );
    assert!(headers.contains_key("x-request-id"));
    assert_eq!(headers["x-content-type-options"], "nosniff");

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(looks_like_mp4(&body));
    assert!(body.ends_with(b"webm-bytes"));
    assert_eq!(entries(root.path()), 0, "workspace must be removed");
}

#[tokio::test]
async fn test_missing_clip_is_bad_request() {
    let root = TempDir::new().unwrap();
    let work_root = root.path().join("jobs");
    let response = router(&work_root)
        .oneshot(upload(&[Part::Text("websiteUrl", "https://example.com")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({ "error": "Missing required files or URL" })
    );
    assert!(!work_root.exists(), "no workspace before validation");
}

#[tokio::test]
async fn test_missing_or_empty_url_is_bad_request() {
    let root = TempDir::new().unwrap();
    let app = router(root.path());

    let cases: [&[Part<'_>]; 2] = [
        &[Part::File("talkingHeadVideo", b"webm")],
        &[
            Part::File("talkingHeadVideo", b"webm"),
            Part::Text("websiteUrl", ""),
        ],
    ];
    for parts in cases {
        let response = app.clone().oneshot(upload(parts)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Missing required files or URL");
    }
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn test_invalid_url_is_bad_request() {
    let root = TempDir::new().unwrap();
    let response = router(root.path())
        .oneshot(upload(&[
            Part::File("talkingHeadVideo", b"webm"),
            Part::Text("websiteUrl", "file:///etc/passwd"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid website URL");
}

#[tokio::test]
async fn test_non_multipart_body_is_invalid_form_data() {
    let root = TempDir::new().unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/api/process-video")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"websiteUrl":"https://example.com"}"#))
        .unwrap();

    let response = router(root.path()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid form data");
}

#[tokio::test]
async fn test_stage_failure_is_generic_500_and_cleans_up() {
    let root = TempDir::new().unwrap();
    let pipeline = VideoPipeline::new(
        Arc::new(FakeCapture::default()),
        Arc::new(FailingStage),
        Arc::new(FakeCompositor),
        PipelineConfig::default().with_work_root(root.path()),
    );

    let response = router_with(pipeline, ApiConfig::default())
        .oneshot(upload(&[
            Part::File("talkingHeadVideo", b"webm"),
            Part::Text("websiteUrl", "https://example.com"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body, serde_json::json!({ "error": "Failed to process video" }));
    assert_eq!(entries(root.path()), 0);
}

fn over_limit_router(root: &Path) -> Router {
    let config = ApiConfig {
        max_body_size: 1024,
        ..ApiConfig::default()
    };
    let pipeline = VideoPipeline::new(
        Arc::new(FakeCapture::default()),
        Arc::new(FakeMasker),
        Arc::new(FakeCompositor),
        PipelineConfig::default().with_work_root(root),
    );
    router_with(pipeline, config)
}

async fn assert_upload_too_large(response: axum::response::Response) {
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(
        json_body(response).await,
        serde_json::json!({ "error": "Upload too large" })
    );
}

#[tokio::test]
async fn test_streamed_upload_over_limit_is_rejected() {
    let root = TempDir::new().unwrap();
    let clip = vec![0u8; 4096];

    let response = over_limit_router(root.path())
        .oneshot(upload(&[
            Part::File("talkingHeadVideo", &clip),
            Part::Text("websiteUrl", "https://example.com"),
        ]))
        .await
        .unwrap();

    assert_upload_too_large(response).await;
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn test_declared_upload_over_limit_is_rejected() {
    let root = TempDir::new().unwrap();
    let clip = vec![0u8; 4096];
    let body = multipart_body(&[
        Part::File("talkingHeadVideo", &clip),
        Part::Text("websiteUrl", "https://example.com"),
    ]);
    let request = Request::builder()
        .method("POST")
        .uri("/api/process-video")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();

    let response = over_limit_router(root.path()).oneshot(request).await.unwrap();

    assert_upload_too_large(response).await;
    assert_eq!(entries(root.path()), 0);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let root = TempDir::new().unwrap();
    let request = Request::builder()
        .uri("/health")
        .header("X-Request-ID", "req-123")
        .body(Body::empty())
        .unwrap();

    let response = router(root.path()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-123");
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_reports_each_tool() {
    let root = TempDir::new().unwrap();
    let request = Request::builder()
        .uri("/ready")
        .body(Body::empty())
        .unwrap();

    let response = router(root.path()).oneshot(request).await.unwrap();
    let status = response.status();
    assert!(status == StatusCode::OK || status == StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(response).await;
    for tool in ["ffmpeg", "ffprobe", "browser"] {
        assert!(body["checks"][tool]["status"].is_string(), "missing {}", tool);
    }
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let root = TempDir::new().unwrap();
    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();

    let response = router(root.path()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
