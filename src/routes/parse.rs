//! Document parse endpoint

use std::path::Path;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::OCR_MODEL;
use crate::state::AppState;

/// Parse request body
#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub file_path: String,
    pub task: String,
}

/// Parse response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ParseResponse {
    pub success: bool,
    pub message: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/parse", post(parse_document))
}

/// Parse a complete document (PDF or image)
async fn parse_document(
    State(state): State<AppState>,
    Json(request): Json<ParseRequest>,
) -> Result<Json<ParseResponse>> {
    if !state.models().is_ready() {
        return Err(AppError::NotReady);
    }
    let model = state.models().get(OCR_MODEL)?;

    let output = state
        .pipeline()
        .recognize(Path::new(&request.file_path), model.as_ref(), &request.task)
        .await?;

    Ok(Json(ParseResponse {
        success: true,
        message: output.text,
    }))
}
