use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use crate::{
    config::Config,
    error::ClientError,
    models::{GenerateRequest, GenerationResult, UploadSlot},
};

/// The remote presentation service as seen by the form.
#[async_trait]
pub trait PresentationApi: Send + Sync {
    async fn request_upload_slot(&self, file_name: &str, content_type: &str) -> Result<UploadSlot, ClientError>;
    async fn upload_file(&self, upload_url: &str, bytes: Bytes, content_type: &str) -> Result<(), ClientError>;
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerationResult, ClientError>;
}

pub struct HttpPresentationApi {
    client: Client,
    base_url: String,
}

impl HttpPresentationApi {
    pub fn new(config: &Config) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &Config) -> Self {
        Self { client, base_url: config.base_url.clone() }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl PresentationApi for HttpPresentationApi {
    async fn request_upload_slot(&self, file_name: &str, content_type: &str) -> Result<UploadSlot, ClientError> {
        let url = self.endpoint("presigned");
        info!("🔗 Requesting upload slot for '{}' ({})", file_name, content_type);

        let response = self.client
            .get(&url)
            .query(&[("fileName", file_name), ("contentType", content_type)])
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let slot: UploadSlot = read_json(ensure_success(response).await?).await?;
        info!("🎯 Got upload slot for '{}' with key {}", file_name, slot.file_key);
        Ok(slot)
    }

    async fn upload_file(&self, upload_url: &str, bytes: Bytes, content_type: &str) -> Result<(), ClientError> {
        let target = redact_query(upload_url);
        info!("📤 Uploading {} bytes to {}", bytes.len(), target);

        let response = self.client
            .put(upload_url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        ensure_success(response).await?;
        info!("✅ Upload to {} finished", target);
        Ok(())
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerationResult, ClientError> {
        let url = self.endpoint("generate");
        info!(
            "🚀 Requesting {} slides on '{}' from {} document(s)",
            request.num_slides.get(),
            request.topic,
            request.document_keys.len()
        );

        let response = self.client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let result: GenerationResult = read_json(ensure_success(response).await?).await?;
        info!(
            "📥 Generation finished: download_url={} inline_data={}",
            result.download_url.is_some(),
            result.file_data.as_ref().map(|d| format!("[{} chars]", d.len())).unwrap_or_else(|| "None".into())
        );
        Ok(result)
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!("⚠️ Could not read error body for status {}: {}", status, e);
            String::new()
        }
    };
    error!("❌ API error response {}: {}", status, body);
    Err(ClientError::Server { status: status.as_u16(), message: body })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        error!("❌ Unreadable response body: {}", e);
        ClientError::Server { status: status.as_u16(), message: format!("unexpected response body: {e}") }
    })
}

/// Presigned URLs carry their credentials in the query string.
fn redact_query(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.to_string()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}
