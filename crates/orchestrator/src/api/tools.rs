//! `GET /tools` and `POST /test-tool` — passthrough onto the tool-gateway
//! server, for callers that want to bypass routing/LLM entirely.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use tg_domain::tool::ToolCall;

use crate::state::AppState;

pub async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    match state.tool_client.list_tools().await {
        Ok(tools) => Json(tools).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

pub async fn test_tool(
    State(state): State<AppState>,
    Json(call): Json<ToolCall>,
) -> impl IntoResponse {
    match state.tool_client.call_tool(call).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
