//! `POST /chat` — spec §6: body `{message, session_id}` →
//! `{response, tools_used, debug, interaction_id, session_id}`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use crate::chat;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    tracing::info!(session_id = %request.session_id, "chat turn");

    match chat::handle(&state, &request.message, &request.session_id).await {
        Ok(outcome) => Json(serde_json::json!({
            "response": outcome.response,
            "tools_used": outcome.tools_used,
            "debug": outcome.debug,
            "interaction_id": outcome.interaction_id,
            "session_id": request.session_id,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "chat turn failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
