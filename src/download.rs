use base64::Engine;

use crate::error::ClientError;

pub const PPTX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// A decoded presentation ready to be saved locally.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl DownloadArtifact {
    pub fn content_disposition(&self) -> String {
        let safe: String = self
            .file_name
            .chars()
            .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
            .collect();
        format!("attachment; filename=\"{safe}\"")
    }
}

pub fn trigger_download(base64_data: &str, file_name: &str) -> Result<DownloadArtifact, ClientError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(base64_data.trim())
        .map_err(|e| ClientError::InvalidFileData(e.to_string()))?;
    Ok(DownloadArtifact { file_name: file_name.to_string(), content_type: PPTX_CONTENT_TYPE, bytes })
}
