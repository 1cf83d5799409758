//! Error types for the OCR Parse Server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::ModelError;
use crate::ocr::RecognitionError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Service not ready")]
    NotReady,

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error(transparent)]
    Recognition(#[from] RecognitionError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Model(e) => e.status_code(),
            AppError::Recognition(e) => e.status_code(),
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            AppError::NotReady => "not_ready",
            AppError::Model(ModelError::NotReady | ModelError::UnknownKind(_)) => "not_ready",
            AppError::Model(_) => "model_error",
            AppError::Recognition(e) => match e {
                RecognitionError::NotFound(_) => "not_found",
                RecognitionError::UnsupportedInput(_) => "unsupported_input",
                RecognitionError::InvalidTask(_) => "invalid_task",
                RecognitionError::Conversion(_) => "conversion_failed",
                RecognitionError::Inference(_) => "inference_failed",
                RecognitionError::Timeout { .. } => "timeout",
                RecognitionError::Output(_) => "output_failed",
                RecognitionError::Failed(_) => "recognition_failed",
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            AppError::NotReady | AppError::Model(ModelError::NotReady) => "Service not ready".to_string(),
            AppError::Model(ModelError::UnknownKind(_)) => {
                tracing::error!("Model configuration error: {}", self);
                "Service not ready".to_string()
            }
            _ if status.is_server_error() => {
                tracing::error!("Request failed: {}", self);
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            error: self.error_type().to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(format!("{:?}", self))
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
