use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

pub const EMPTY_FORM_MESSAGE: &str = "Please provide either a topic or upload documents.";
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Number of slides requested, always within `MIN..=MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SlideCount(u8);

impl SlideCount {
    pub const MIN: u8 = 3;
    pub const MAX: u8 = 15;
    pub const DEFAULT: u8 = 5;

    pub fn new(value: i64) -> Result<Self, ClientError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ClientError::Validation(format!(
                "Number of slides must be between {} and {}.",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn get(self) -> u8 { self.0 }
}

impl Default for SlideCount {
    fn default() -> Self { Self(Self::DEFAULT) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content_type: Option<&str>, bytes: impl Into<Bytes>) -> Self {
        let content_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE);
        Self { name: name.into(), content_type: content_type.to_string(), bytes: bytes.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionRequest {
    pub topic: String,
    pub slide_count: SlideCount,
    /// Uploaded in this order.
    pub files: Vec<SelectedFile>,
}

impl SubmissionRequest {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.topic.is_empty() && self.files.is_empty() {
            return Err(ClientError::Validation(EMPTY_FORM_MESSAGE.to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct UploadSlot {
    #[serde(rename = "presignedUrl")]
    pub upload_url: String,
    #[serde(rename = "fileKey")]
    pub file_key: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub topic: String,
    pub num_slides: SlideCount,
    pub document_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GenerationResult {
    #[serde(default, rename = "downloadUrl")]
    pub download_url: Option<String>,
    /// Base64 encoded presentation, used when no URL is returned.
    #[serde(default, rename = "fileData")]
    pub file_data: Option<String>,
    #[serde(default, rename = "filename")]
    pub file_name: Option<String>,
}
