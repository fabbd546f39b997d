//! The form endpoints driven through the router.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use base64::Engine;
use bytes::Bytes;
use deck_form::{
    api::PresentationApi,
    config::Config,
    download::PPTX_CONTENT_TYPE,
    error::ClientError,
    models::{GenerateRequest, GenerationResult, UploadSlot},
    routes::{router, AppState},
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tokio::sync::Notify;
use tower::ServiceExt;

const BOUNDARY: &str = "deckformboundary";

#[derive(Default)]
struct FakeApi {
    uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
    generated: Mutex<Vec<GenerateRequest>>,
    result: GenerationResult,
}

#[async_trait]
impl PresentationApi for FakeApi {
    async fn request_upload_slot(&self, file_name: &str, _content_type: &str) -> Result<UploadSlot, ClientError> {
        Ok(UploadSlot { upload_url: format!("https://bucket.test/{file_name}"), file_key: format!("uploads/{file_name}") })
    }

    async fn upload_file(&self, upload_url: &str, bytes: Bytes, content_type: &str) -> Result<(), ClientError> {
        self.uploads.lock().push((upload_url.to_string(), content_type.to_string(), bytes.to_vec()));
        Ok(())
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerationResult, ClientError> {
        self.generated.lock().push(request.clone());
        Ok(self.result.clone())
    }
}

/// Holds `generate` until released.
#[derive(Default)]
struct GatedApi {
    release: Notify,
}

#[async_trait]
impl PresentationApi for GatedApi {
    async fn request_upload_slot(&self, file_name: &str, _content_type: &str) -> Result<UploadSlot, ClientError> {
        Ok(UploadSlot { upload_url: format!("https://bucket.test/{file_name}"), file_key: format!("uploads/{file_name}") })
    }

    async fn upload_file(&self, _upload_url: &str, _bytes: Bytes, _content_type: &str) -> Result<(), ClientError> {
        Ok(())
    }

    async fn generate(&self, _request: &GenerateRequest) -> Result<GenerationResult, ClientError> {
        self.release.notified().await;
        Ok(GenerationResult { download_url: Some("https://cdn.test/late.pptx".into()), ..Default::default() })
    }
}

fn app<A: PresentationApi + 'static>(api: Arc<A>) -> Router {
    let config = Config::new("http://api.test").unwrap();
    router(AppState::new(api), &config)
}

async fn current_state(app: &Router) -> Value {
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/state").body(Body::empty()).unwrap())
        .await
        .unwrap();
    json_body(response).await
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, Option<&'a str>, &'a [u8]),
}

fn multipart(parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes());
            }
            Part::File(file_name, content_type, data) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"documents\"; filename=\"{file_name}\"\r\n").as_bytes(),
                );
                if let Some(ct) = content_type {
                    body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
                }
                body.extend_from_slice(b"\r\n");
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/submit")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn serves_the_form_page() {
    let response = app(Arc::new(FakeApi::default()))
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let page = String::from_utf8(page.to_vec()).unwrap();
    assert!(page.contains("id=\"numSlides\""));
    assert!(page.contains("/api/submit"));
    // Polling follows the server's loading flag, not just this tab's request.
    assert!(page.contains("keepPolling(!!state.isLoading)"));
}

#[tokio::test]
async fn empty_submission_is_rejected() {
    let api = Arc::new(FakeApi::default());
    let response = app(api.clone()).oneshot(multipart(&[Part::Text("topic", "")])).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let state = json_body(response).await;
    assert_eq!(state["phase"], "failed");
    assert_eq!(state["errorMessage"], "Please provide either a topic or upload documents.");
    assert!(api.generated.lock().is_empty());
}

#[tokio::test]
async fn out_of_range_slide_count_is_rejected() {
    let api = Arc::new(FakeApi {
        result: GenerationResult { download_url: Some("https://cdn.test/old.pptx".into()), ..Default::default() },
        ..Default::default()
    });
    let app = app(api.clone());

    let first = app.clone().oneshot(multipart(&[Part::Text("topic", "Volcanoes")])).await.unwrap();
    assert_eq!(json_body(first).await["downloadUrl"], "https://cdn.test/old.pptx");

    let response = app
        .clone()
        .oneshot(multipart(&[Part::Text("topic", "Volcanoes"), Part::Text("numSlides", "40")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let state = json_body(response).await;
    assert_eq!(state["phase"], "failed");
    assert_eq!(state["errorMessage"], "Number of slides must be between 3 and 15.");
    assert!(state.get("downloadUrl").is_none());
    assert_eq!(api.generated.lock().len(), 1);

    let state = current_state(&app).await;
    assert_eq!(state["phase"], "failed");
    assert!(state.get("downloadUrl").is_none());
}

#[tokio::test]
async fn non_numeric_slide_count_is_rejected() {
    let response = app(Arc::new(FakeApi::default()))
        .oneshot(multipart(&[Part::Text("topic", "Volcanoes"), Part::Text("numSlides", "many")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["phase"], "failed");
}

#[tokio::test]
async fn submission_survives_a_dropped_connection() {
    let api = Arc::new(GatedApi::default());
    let app = app(api.clone());

    // The client gives up while generation is still pending.
    let dropped = tokio::time::timeout(
        Duration::from_millis(100),
        app.clone().oneshot(multipart(&[Part::Text("topic", "Glaciers")])),
    )
    .await;
    assert!(dropped.is_err());

    let state = current_state(&app).await;
    assert_eq!(state["phase"], "generating");
    assert_eq!(state["isLoading"], true);

    api.release.notify_one();
    let mut state = current_state(&app).await;
    for _ in 0..100 {
        if state["isLoading"] == false {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        state = current_state(&app).await;
    }
    assert_eq!(state["phase"], "ready");
    assert_eq!(state["downloadUrl"], "https://cdn.test/late.pptx");

    let next = app.clone().oneshot(multipart(&[Part::Text("topic", "Fjords")])).await.unwrap();
    assert_eq!(next.status(), StatusCode::OK);
}

#[tokio::test]
async fn submission_uploads_files_and_exposes_download_url() {
    let api = Arc::new(FakeApi {
        result: GenerationResult { download_url: Some("https://cdn.test/deck.pptx?token=1".into()), ..Default::default() },
        ..Default::default()
    });
    let response = app(api.clone())
        .oneshot(multipart(&[
            Part::Text("topic", "Volcanoes"),
            Part::Text("numSlides", "9"),
            Part::File("first.txt", Some("text/plain"), b"lava"),
            Part::File("second.bin", None, b"\x00\x01"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let state = json_body(response).await;
    assert_eq!(state["phase"], "ready");
    assert_eq!(state["isLoading"], false);
    assert_eq!(state["downloadUrl"], "https://cdn.test/deck.pptx?token=1");
    assert_eq!(state["selectedFiles"], serde_json::json!(["first.txt", "second.bin"]));
    assert_eq!(state["statusMessage"], "Presentation generated successfully!");

    assert_eq!(
        api.uploads.lock().clone(),
        vec![
            ("https://bucket.test/first.txt".to_string(), "text/plain".to_string(), b"lava".to_vec()),
            ("https://bucket.test/second.bin".to_string(), "application/octet-stream".to_string(), vec![0, 1]),
        ]
    );
    let generated = api.generated.lock();
    assert_eq!(generated.len(), 1);
    assert_eq!(generated[0].num_slides.get(), 9);
    assert_eq!(generated[0].document_keys, vec!["uploads/first.txt".to_string(), "uploads/second.bin".to_string()]);
}

#[tokio::test]
async fn inline_presentation_can_be_downloaded() {
    let deck = b"PK\x03\x04fake pptx".to_vec();
    let api = Arc::new(FakeApi {
        result: GenerationResult {
            file_data: Some(base64::engine::general_purpose::STANDARD.encode(&deck)),
            file_name: Some("volcanoes.pptx".into()),
            ..Default::default()
        },
        ..Default::default()
    });
    let app = app(api);

    let download = Request::builder().uri("/api/download").body(Body::empty()).unwrap();
    let before = app.clone().oneshot(download).await.unwrap();
    assert_eq!(before.status(), StatusCode::NOT_FOUND);

    let response = app.clone().oneshot(multipart(&[Part::Text("topic", "Volcanoes")])).await.unwrap();
    let state = json_body(response).await;
    assert_eq!(state["inlineFileName"], "volcanoes.pptx");
    assert!(state.get("downloadUrl").is_none());

    let response = app
        .oneshot(Request::builder().uri("/api/download").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], PPTX_CONTENT_TYPE);
    assert_eq!(response.headers()[header::CONTENT_DISPOSITION], "attachment; filename=\"volcanoes.pptx\"");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.to_vec(), deck);
}

#[tokio::test]
async fn state_endpoint_starts_idle() {
    let response = app(Arc::new(FakeApi::default()))
        .oneshot(Request::builder().uri("/api/state").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let state = json_body(response).await;
    assert_eq!(state["phase"], "idle");
    assert_eq!(state["slideCount"], 5);
}
