use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use include_dir::{include_dir, Dir};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{
    api::PresentationApi,
    config::Config,
    download::trigger_download,
    error::ClientError,
    models::{SelectedFile, SlideCount, SubmissionRequest},
    state::{FormHandle, FormState},
    workflow,
};

static PAGE_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

#[derive(Clone)]
pub struct AppState {
    pub form: FormHandle,
    pub api: Arc<dyn PresentationApi>,
}

impl AppState {
    pub fn new(api: Arc<dyn PresentationApi>) -> Self {
        Self { form: FormHandle::default(), api }
    }
}

pub fn router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/state", get(get_state))
        .route("/api/submit", post(submit_form))
        .route("/api/download", get(download_inline))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .with_state(state)
}

pub async fn index() -> Response {
    match PAGE_ASSETS.get_file("index.html").and_then(|f| f.contents_utf8()) {
        Some(page) => Html(page).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

pub async fn get_state(State(state): State<AppState>) -> Json<FormState> {
    Json(state.form.snapshot())
}

pub async fn submit_form(State(state): State<AppState>, multipart: Multipart) -> Response {
    let request = match read_submission(multipart).await {
        Ok(request) => request,
        Err(e) => {
            state.form.reject(&e);
            return (e.status_code(), Json(state.form.snapshot())).into_response();
        }
    };

    // The submission runs on its own task so a dropped connection cannot
    // abandon it halfway.
    let task_state = state.clone();
    let task = tokio::spawn(async move {
        workflow::submit(task_state.api.as_ref(), &task_state.form, request).await
    });

    let outcome = match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("❌ Submission task ended abnormally: {}", e);
            Err(ClientError::Interrupted)
        }
    };
    match outcome {
        Ok(_) => Json(state.form.snapshot()).into_response(),
        Err(e) => (e.status_code(), Json(state.form.snapshot())).into_response(),
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<SubmissionRequest, ClientError> {
    let mut request = SubmissionRequest::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ClientError::Validation(format!("Malformed form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "topic" => {
                request.topic = field.text().await.map_err(|e| ClientError::Validation(format!("Malformed topic: {e}")))?;
            }
            "numSlides" => {
                let raw = field.text().await.map_err(|e| ClientError::Validation(format!("Malformed slide count: {e}")))?;
                let value: i64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ClientError::Validation(format!("Number of slides must be a number, got '{raw}'.")))?;
                request.slide_count = SlideCount::new(value)?;
            }
            "documents" => {
                let file_name = field.file_name().unwrap_or("document").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| ClientError::Validation(format!("Could not read '{file_name}': {e}")))?;
                // Browsers send an empty part when no file was chosen.
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                info!("📎 Received document '{}' ({} bytes)", file_name, bytes.len());
                request.files.push(SelectedFile::new(file_name, content_type.as_deref(), bytes));
            }
            other => info!("Ignoring unknown form field '{}'", other),
        }
    }
    Ok(request)
}

pub async fn download_inline(State(state): State<AppState>) -> Response {
    let Some(inline) = state.form.inline_file() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let artifact = match trigger_download(&inline.data, &inline.file_name) {
        Ok(artifact) => artifact,
        Err(e) => {
            error!("❌ Inline presentation could not be decoded: {}", e);
            return (e.status_code(), e.user_message()).into_response();
        }
    };

    let disposition = match HeaderValue::from_str(&artifact.content_disposition()) {
        Ok(value) => value,
        Err(_) => HeaderValue::from_static("attachment; filename=\"presentation.pptx\""),
    };
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static(artifact.content_type)),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    info!("📥 Serving inline presentation '{}' ({} bytes)", artifact.file_name, artifact.bytes.len());
    (StatusCode::OK, headers, artifact.bytes).into_response()
}
