//! `POST /v1/generate` — reserved surface, mock response only (spec §6).

use axum::response::{IntoResponse, Json};

pub async fn generate() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "not_implemented",
        "response": "mock response",
    }))
}
