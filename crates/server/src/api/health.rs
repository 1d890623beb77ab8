//! `GET /health` — spec §6: `{status, cache_backend, home_assistant}`.

use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let cache_backend = if state.config.redis.is_some() {
        "redis"
    } else {
        "memory"
    };

    Json(serde_json::json!({
        "status": "ok",
        "cache_backend": cache_backend,
        "home_assistant": state.ha_sync.connection_status(),
    }))
}
