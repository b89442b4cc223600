//! HTTP API tests driven through the router without a socket.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use image::{ImageFormat, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

use easel::server::{AppState, ServerConfig, router};

fn temp_upload_dir() -> PathBuf {
    std::env::temp_dir().join(format!("easel-http-{}", uuid::Uuid::new_v4()))
}

fn app_with(upload_dir: PathBuf) -> Router {
    let config = ServerConfig {
        upload_dir,
        ..Default::default()
    };
    router(Arc::new(AppState::new(config).unwrap()))
}

fn app() -> Router {
    app_with(temp_upload_dir())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn init(app: &Router, width: u32, height: u32) -> String {
    let (status, body) = send_json(
        app,
        post_json("/api/canvas/init", json!({"width": width, "height": height})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_init_returns_identity() {
    let app = app();
    let (status, body) = send_json(
        &app,
        post_json("/api/canvas/init", json!({"width": 400, "height": 300})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["width"], 400);
    assert_eq!(body["height"], 300);
    assert!(body["id"].as_str().unwrap().starts_with("c_"));
}

#[tokio::test]
async fn test_init_keeps_client_id() {
    let app = app();
    let (status, body) = send_json(
        &app,
        post_json("/api/canvas/init", json!({"width": 10, "height": 10, "id": "mine"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "mine");
}

#[tokio::test]
async fn test_init_missing_dimensions_is_400() {
    let app = app();
    let (status, body) = send_json(&app, post_json("/api/canvas/init", json!({"width": 100}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_init_malformed_json_is_400() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/canvas/init")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn test_add_element_acknowledged() {
    let app = app();
    let id = init(&app, 100, 100).await;

    let (status, body) = send_json(
        &app,
        post_json(
            "/api/canvas/elements",
            json!({
                "id": id,
                "type": "rectangle",
                "properties": {"x": 10, "y": 10, "w": 20, "h": 20, "color": "red"}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Element added");
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["elements"], 1);
}

#[tokio::test]
async fn test_add_element_unknown_session_is_404() {
    let app = app();
    let (status, body) = send_json(
        &app,
        post_json(
            "/api/canvas/elements",
            json!({"id": "c_nope", "type": "triangle", "properties": {}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn test_add_element_missing_fields_is_400() {
    let app = app();
    let id = init(&app, 100, 100).await;

    let (status, body) = send_json(
        &app,
        post_json(
            "/api/canvas/elements",
            json!({"id": id, "type": "circle", "properties": {"x": 5}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (status, _) = send_json(
        &app,
        post_json(
            "/api/canvas/elements",
            json!({"id": id, "type": "triangle", "properties": {}}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(
        &app,
        post_json("/api/canvas/elements", json!({"type": "circle"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_image_with_ftp_source_is_400() {
    let app = app();
    let id = init(&app, 100, 100).await;

    let (status, body) = send_json(
        &app,
        post_json(
            "/api/canvas/elements",
            json!({
                "id": id,
                "type": "image",
                "properties": {"url": "ftp://example.com/a.png", "x": 0, "y": 0, "w": 10, "h": 10}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "fetch");
}

#[tokio::test]
async fn test_export_pdf_headers_and_body() {
    let app = app();
    let id = init(&app, 400, 300).await;
    send_json(
        &app,
        post_json(
            "/api/canvas/elements",
            json!({"id": id, "type": "circle", "properties": {"x": 200, "y": 150, "radius": 40, "color": "blue"}}),
        ),
    )
    .await;

    for uri in [
        format!("/api/canvas/export?id={}", id),
        format!("/api/canvas/export/{}", id),
    ] {
        let (status, headers, body) = send(&app, get(&uri)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            format!("attachment; filename=\"canvas_{}.pdf\"", id).as_str()
        );
        assert!(body.starts_with(b"%PDF-"));
    }
}

#[tokio::test]
async fn test_export_zip_format() {
    let app = app();
    let id = init(&app, 60, 40).await;

    for uri in [
        format!("/api/canvas/export?id={}&format=zip", id),
        format!("/api/canvas/export/{}?format=zip", id),
    ] {
        let (status, headers, body) = send(&app, get(&uri)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            format!("attachment; filename=\"canvas_{}.zip\"", id).as_str()
        );
        assert!(body.starts_with(b"PK"));

        let mut archive = zip::ZipArchive::new(Cursor::new(body)).unwrap();
        let mut entry = archive.by_name(&format!("canvas_{}.pdf", id)).unwrap();
        let mut pdf = Vec::new();
        std::io::Read::read_to_end(&mut entry, &mut pdf).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
    }

    let (status, _, _) = send(&app, get(&format!("/api/canvas/export/{}?format=pdf", id))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_export_unknown_format_is_400() {
    let app = app();
    let id = init(&app, 10, 10).await;

    let (status, body) =
        send_json(&app, get(&format!("/api/canvas/export?id={}&format=tar", id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (status, _) = send_json(&app, get(&format!("/api/canvas/export/{}?format=tar", id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_unknown_or_missing_id() {
    let app = app();

    let (status, _, _) = send(&app, get("/api/canvas/export?id=c_nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, get("/api/canvas/export")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_describe_and_preview() {
    let app = app();
    let id = init(&app, 30, 20).await;
    send_json(
        &app,
        post_json(
            "/api/canvas/elements",
            json!({"id": id, "type": "text", "properties": {"text": "Hi", "x": 2, "y": 2}}),
        ),
    )
    .await;

    let (status, body) = send_json(&app, get(&format!("/api/canvas/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["element_count"], 1);
    assert_eq!(body["elements"][0]["type"], "text");
    assert_eq!(body["elements"][0]["text"], "Hi");

    let (status, headers, png) = send(&app, get(&format!("/api/canvas/{}/preview", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (30, 20));
}

fn multipart_body(boundary: &str, fields: &[(&str, &str)], file: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"dot.png\"\r\nContent-Type: image/png\r\n\r\n",
                boundary
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

fn post_multipart(body: Vec<u8>, boundary: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/canvas/add")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_multipart_upload_drawn_and_cleaned_up() {
    let upload_dir = temp_upload_dir();
    let app = app_with(upload_dir.clone());
    let id = init(&app, 20, 20).await;

    let img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 255, 255]));
    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, ImageFormat::Png).unwrap();

    let boundary = "easel-test-boundary";
    let body = multipart_body(
        boundary,
        &[("id", id.as_str()), ("x", "0"), ("y", "0"), ("w", "10"), ("h", "10")],
        Some(&png.into_inner()),
    );
    let (status, body) = send_json(&app, post_multipart(body, boundary)).await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["elements"], 1);
    let leftovers = std::fs::read_dir(&upload_dir).unwrap().count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_multipart_shape_fields() {
    let app = app();
    let id = init(&app, 20, 20).await;

    let boundary = "easel-test-boundary";
    let body = multipart_body(
        boundary,
        &[("id", id.as_str()), ("type", "circle"), ("x", "10"), ("y", "10"), ("radius", "abc")],
        None,
    );
    let (status, body) = send_json(&app, post_multipart(body, boundary)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");
}
