//! Liveness and readiness endpoints

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
}

/// Static liveness payload. Does not consult readiness.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "OCR API is running",
    })
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: if state.models().is_ready() { "ready" } else { "loading" },
        version: env!("CARGO_PKG_VERSION"),
        service: "ocr-parse-server",
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}
