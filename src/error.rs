use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")] Validation(String),
    #[error("Network error: {0}")] Network(String),
    #[error("Request failed with status code {status}: {message}")] Server { status: u16, message: String },
    #[error("Invalid file data: {0}")] InvalidFileData(String),
    #[error("A presentation is already being generated")] SubmissionInProgress,
    #[error("Submission was interrupted before it finished")] Interrupted,
}

impl ClientError {
    /// Message shown in the form's error alert.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(msg) => msg.clone(),
            other => format!("Error: {other}"),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ClientError::Validation(_) => StatusCode::BAD_REQUEST,
            ClientError::Network(_) | ClientError::Server { .. } => StatusCode::BAD_GATEWAY,
            ClientError::InvalidFileData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ClientError::SubmissionInProgress => StatusCode::CONFLICT,
            ClientError::Interrupted => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ClientError::Server { status: status.as_u16(), message: e.to_string() },
            None => ClientError::Network(e.to_string()),
        }
    }
}
