//! Recognition Types

use std::path::PathBuf;

/// Result of a recognition run
#[derive(Debug, Clone)]
pub struct RecognitionOutput {
    /// Per-page results joined with a blank line
    pub text: String,
    /// Number of images sent to the model
    pub page_count: usize,
}

/// Recognition error types
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("Input file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Single task recognition supports PDF and image files, got: {0}")]
    UnsupportedInput(String),

    #[error("Unknown task: {0}")]
    InvalidTask(String),

    #[error("Failed to convert PDF to images: {0}")]
    Conversion(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("{stage} timed out after {secs} seconds")]
    Timeout { stage: &'static str, secs: u64 },

    #[error("Failed to write result: {0}")]
    Output(String),

    #[error("Single task recognition failed: {0}")]
    Failed(String),
}

impl RecognitionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UnsupportedInput(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::InvalidTask(_) => StatusCode::BAD_REQUEST,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
