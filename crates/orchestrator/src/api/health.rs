//! `GET /health` — spec §6. The orchestrator has no cache and no Home
//! Assistant link of its own, so those fields report on the ephemeral
//! interaction log instead, which is the orchestrator's only "backend".

use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "cache_backend": if state.feedback.is_some() { "redis" } else { "disabled" },
        "tool_server": state.config.tool_server_url,
    }))
}
