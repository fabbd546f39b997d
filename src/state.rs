use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde_with::skip_serializing_none;
use uuid::Uuid;

use crate::{
    error::ClientError,
    models::{GenerationResult, SlideCount, SubmissionRequest},
};

pub const STATUS_UPLOADING: &str = "Uploading files...";
pub const STATUS_GENERATING: &str = "Generating presentation...";
pub const STATUS_DONE: &str = "Presentation generated successfully!";
pub const DEFAULT_FILE_NAME: &str = "presentation.pptx";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Uploading,
    Generating,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineFile {
    pub file_name: String,
    pub data: String,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub submission_id: Option<Uuid>,
    pub phase: Phase,
    pub topic: String,
    pub slide_count: SlideCount,
    pub selected_files: Vec<String>,
    pub uploaded_files: usize,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub status_message: String,
    pub download_url: Option<String>,
    pub inline_file_name: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Shared handle to the single form state. Only the submission routine writes
/// to it, and never while holding the lock across a network call.
#[derive(Debug, Clone, Default)]
pub struct FormHandle {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    view: FormState,
    inline_file: Option<InlineFile>,
}

impl Inner {
    fn reject(&mut self, error: &ClientError) {
        self.inline_file = None;
        let state = &mut self.view;
        state.phase = Phase::Failed;
        state.error_message = Some(error.user_message());
        state.download_url = None;
        state.inline_file_name = None;
    }
}

impl FormHandle {
    pub fn snapshot(&self) -> FormState {
        self.inner.read().view.clone()
    }

    pub fn inline_file(&self) -> Option<InlineFile> {
        self.inner.read().inline_file.clone()
    }

    /// Accepts a new submission, resetting the previous attempt.
    ///
    /// Refused while another submission is loading; a request that fails
    /// validation moves the form to `Failed` without starting anything.
    pub fn begin(&self, request: &SubmissionRequest) -> Result<Uuid, ClientError> {
        let mut inner = self.inner.write();
        if inner.view.is_loading {
            return Err(ClientError::SubmissionInProgress);
        }
        if let Err(e) = request.validate() {
            inner.reject(&e);
            return Err(e);
        }

        let id = Uuid::new_v4();
        inner.inline_file = None;
        inner.view = FormState {
            submission_id: Some(id),
            phase: Phase::Uploading,
            topic: request.topic.clone(),
            slide_count: request.slide_count,
            selected_files: request.files.iter().map(|f| f.name.clone()).collect(),
            is_loading: true,
            status_message: STATUS_UPLOADING.to_string(),
            started_at: Some(Utc::now()),
            ..FormState::default()
        };
        Ok(id)
    }

    /// Records a submission that was refused before it started. A running
    /// submission is left alone.
    pub fn reject(&self, error: &ClientError) {
        let mut inner = self.inner.write();
        if !inner.view.is_loading {
            inner.reject(error);
        }
    }

    pub fn file_uploaded(&self) {
        self.inner.write().view.uploaded_files += 1;
    }

    pub fn generating(&self) {
        let mut inner = self.inner.write();
        let state = &mut inner.view;
        state.phase = Phase::Generating;
        state.status_message = STATUS_GENERATING.to_string();
    }

    pub fn complete(&self, result: &GenerationResult) {
        let inline_file = result.file_data.as_ref().map(|data| InlineFile {
            file_name: result.file_name.clone().unwrap_or_else(|| DEFAULT_FILE_NAME.to_string()),
            data: data.clone(),
        });

        let mut inner = self.inner.write();
        let state = &mut inner.view;
        state.phase = Phase::Ready;
        state.is_loading = false;
        state.status_message = STATUS_DONE.to_string();
        state.download_url = result.download_url.clone();
        state.inline_file_name = inline_file.as_ref().map(|f| f.file_name.clone());
        state.finished_at = Some(Utc::now());
        inner.inline_file = inline_file;
    }

    pub fn fail(&self, error: &ClientError) {
        let mut inner = self.inner.write();
        let state = &mut inner.view;
        state.phase = Phase::Failed;
        state.is_loading = false;
        state.error_message = Some(error.user_message());
        state.finished_at = Some(Utc::now());
    }
}
