//! Model Types
//!
//! Error type shared by the model manager and the backends.

/// Model error types
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Models not ready")]
    NotReady,

    #[error("Model kind not loaded: {0}")]
    UnknownKind(String),

    #[error("Invalid model configuration: {0}")]
    Config(String),

    #[error("Failed to load model: {0}")]
    Load(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("API error: {0}")]
    ApiError(String),
}

impl ModelError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::NotReady | Self::UnknownKind(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
