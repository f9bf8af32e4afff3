//! Web UI Integration Tests
//!
//! axum のルーティングを `tower::ServiceExt::oneshot` で検証する

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for oneshot

use socpack::adapter::config::Config;
use socpack::adapter::repositories::CsvExportRepository;
use socpack::driver::web::{create_app, AppState};
use socpack::driver::workflow::ArchiveWorkflow;

const BOUNDARY: &str = "socpack-test-boundary";

fn create_test_app(dir: &std::path::Path, factory: Arc<common::RecordingFactory>) -> Router {
    let config = Config {
        work_dir: dir.join("work"),
        output_dir: dir.join("out"),
        ..Config::default()
    };
    let exporter = Arc::new(CsvExportRepository::new(config.output_dir.clone()));
    let workflow = ArchiveWorkflow::with_repositories(&config, exporter, factory);
    create_app(
        AppState::new(Arc::new(workflow)),
        config.server.max_upload_bytes,
    )
}

fn multipart_body(field: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(temp_dir.path(), Arc::new(common::RecordingFactory::new()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_index_has_upload_form() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(temp_dir.path(), Arc::new(common::RecordingFactory::new()));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"enctype="multipart/form-data""#));
    assert!(html.contains(r#"name="file""#));
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(temp_dir.path(), Arc::new(common::RecordingFactory::new()));

    let response = app
        .oneshot(upload_request(multipart_body("other", "bundle.zip", b"PK")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_rejects_non_zip() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(temp_dir.path(), Arc::new(common::RecordingFactory::new()));

    let response = app
        .oneshot(upload_request(multipart_body("file", "data.csv", b"a,b\n")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Please upload a ZIP file"));
}

#[tokio::test]
async fn test_upload_processes_bundle() {
    let temp_dir = TempDir::new().unwrap();
    let zip = temp_dir.path().join("bundle.zip");
    common::sample_bundle(&zip);
    let factory = Arc::new(common::RecordingFactory::new());
    let app = create_test_app(temp_dir.path(), factory.clone());

    let response = app
        .oneshot(upload_request(multipart_body(
            "file",
            "bundle.zip",
            &fs::read(&zip).unwrap(),
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Processing a.csv (1/3)... 33% done"));
    assert!(html.contains("Skipping c.csv due to error"));
    assert!(html.contains("<td>a0</td>"));
    assert!(html.contains("Data uploaded to Google Sheets successfully"));
    assert_eq!(factory.sheet.values.lock().unwrap().len(), 5);

    // The uploaded archive itself is not kept in the work directory
    let leftovers: Vec<_> = fs::read_dir(temp_dir.path().join("work"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".zip"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_upload_invalid_zip_is_bad_request() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_test_app(temp_dir.path(), Arc::new(common::RecordingFactory::new()));

    let response = app
        .oneshot(upload_request(multipart_body(
            "file",
            "bundle.zip",
            b"this is not a zip archive",
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Failed to extract ZIP"));
}
