use std::collections::HashSet;
use std::fs;
use std::path::Path;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use framebox_core::{content_digest, Frame};
use frameboxd::{router, AppState};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00";
const BOUNDARY: &str = "framebox-test-boundary";

fn frame_dir(count: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    for idx in 0..count {
        fs::write(
            dir.path().join(format!("frame {idx}.png")),
            format!("pixels {idx}"),
        )
        .unwrap();
    }
    dir
}

fn app(dir: &Path) -> Router {
    router(AppState::new(dir).with_seed(Some(42)))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn upload(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    Request::builder()
        .method("POST")
        .uri("/frame")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn send_frames(app: Router, uri: &str) -> (StatusCode, Vec<Frame>) {
    let (status, body) = send(app, get(uri)).await;
    assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&body));
    (status, serde_json::from_slice(&body).unwrap())
}

fn file_count(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn random_returns_requested_unique_frames() {
    let dir = frame_dir(10);
    let (_, frames) = send_frames(app(dir.path()), "/frame/random/3").await;
    assert_eq!(frames.len(), 3);
    let names: HashSet<_> = frames.iter().map(|f| f.filename.clone()).collect();
    assert_eq!(names.len(), 3);
    for frame in &frames {
        assert!(frame.subtitle.starts_with("frame "));
        assert!(dir.path().join(&frame.filename).exists());
    }
}

#[tokio::test]
async fn random_zero_is_an_empty_array() {
    let dir = frame_dir(2);
    let (status, body) = send(app(dir.path()), get("/frame/random/0")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"[]");
}

#[tokio::test]
async fn random_rejects_bad_counts() {
    let dir = frame_dir(10);
    for uri in ["/frame/random/-1", "/frame/random/asdf", "/frame/random/11"] {
        let (status, _) = send(app(dir.path()), get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn missing_image_dir_is_a_server_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nonexistent");
    for uri in [
        "/frame/random/3",
        "/frame/fuzzy/hello/1",
        "/frame/exact/hello/1",
    ] {
        let (status, _) = send(app(&missing), get(uri)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
    }
}

#[tokio::test]
async fn seeded_selection_is_repeatable() {
    let dir = frame_dir(10);
    let (_, first) = send_frames(app(dir.path()), "/frame/random/5").await;
    let (_, second) = send_frames(app(dir.path()), "/frame/random/5").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn fuzzy_decodes_query_and_ranks() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("hello world.png"), b"1").unwrap();
    fs::write(dir.path().join("goodbye moon.png"), b"2").unwrap();

    let (_, frames) = send_frames(app(dir.path()), "/frame/fuzzy/hello%20wrld/2").await;
    assert_eq!(frames[0].subtitle, "hello world");

    let (_, none) = send_frames(app(dir.path()), "/frame/fuzzy/zzzzzzzzzzzzzzzzzzzz/1").await;
    assert!(none.is_empty());

    let (status, _) = send(app(dir.path()), get("/frame/fuzzy/hello/3")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn exact_matches_ignore_case() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("apple.png"), b"1").unwrap();
    fs::write(dir.path().join("banana.png"), b"2").unwrap();

    let (_, frames) = send_frames(app(dir.path()), "/frame/exact/Apple/2").await;
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].subtitle, "apple");

    let (_, none) = send_frames(app(dir.path()), "/frame/exact/grape/1").await;
    assert!(none.is_empty());
}

#[tokio::test]
async fn download_serves_file_bytes() {
    let dir = TempDir::new().unwrap();
    let name = format!("apple_{}.png", content_digest(b"png bytes"));
    fs::write(dir.path().join(&name), b"png bytes").unwrap();

    let response = app(dir.path())
        .oneshot(get(&format!("/frame/{name}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"png bytes");
}

#[tokio::test]
async fn download_missing_and_traversal() {
    let dir = TempDir::new().unwrap();
    let (status, _) = send(app(dir.path()), get("/frame/absent.png")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(app(dir.path()), get("/frame/..%2Fsecret")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_stores_content_addressed_frame() {
    let dir = TempDir::new().unwrap();
    let (status, _) = send(app(dir.path()), upload("image", "test.jpg", JPEG)).await;
    assert_eq!(status, StatusCode::CREATED);

    let stored = dir
        .path()
        .join(format!("test_{}.jpg", content_digest(JPEG)));
    assert_eq!(fs::read(stored).unwrap(), JPEG);
    assert_eq!(file_count(dir.path()), 1);
}

#[tokio::test]
async fn upload_decodes_percent_encoded_filename() {
    let dir = TempDir::new().unwrap();
    let (status, _) = send(app(dir.path()), upload("image", "my%20frame.jpg", JPEG)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(dir
        .path()
        .join(format!("my frame_{}.jpg", content_digest(JPEG)))
        .exists());
}

#[tokio::test]
async fn upload_treats_plus_as_space() {
    let dir = TempDir::new().unwrap();
    let (status, _) = send(app(dir.path()), upload("image", "my+frame.jpg", JPEG)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(dir
        .path()
        .join(format!("my frame_{}.jpg", content_digest(JPEG)))
        .exists());
    assert_eq!(file_count(dir.path()), 1);
}

#[tokio::test]
async fn upload_rejects_non_images() {
    let dir = TempDir::new().unwrap();
    let (status, _) = send(app(dir.path()), upload("image", "test.jpg", b"not an image")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn upload_requires_image_field() {
    let dir = TempDir::new().unwrap();
    let (status, _) = send(app(dir.path()), upload("file", "test.jpg", JPEG)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn upload_rejects_oversized_body() {
    let dir = TempDir::new().unwrap();
    let mut content = JPEG.to_vec();
    content.resize(11 << 20, 0);
    let (status, _) = send(app(dir.path()), upload("image", "big.jpg", &content)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn uploaded_frame_is_listed() {
    let dir = TempDir::new().unwrap();
    let (status, _) = send(app(dir.path()), upload("image", "fresh.jpg", JPEG)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, frames) = send_frames(app(dir.path()), "/frame/exact/FRESH/1").await;
    assert_eq!(frames.len(), 1);
    assert_eq!(
        frames[0].filename,
        format!("fresh_{}.jpg", content_digest(JPEG))
    );
}
