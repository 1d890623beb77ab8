//! `GET /v1/tools/list` and `POST /v1/tools/call` (spec §6).

use axum::extract::State;
use axum::response::{IntoResponse, Json};

use tg_domain::tool::ToolCall;

use crate::state::AppState;

pub async fn list_tools(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.dispatcher.list_tools())
}

pub async fn call_tool(
    State(state): State<AppState>,
    Json(call): Json<ToolCall>,
) -> impl IntoResponse {
    tracing::info!(tool_name = %call.tool_name, session_id = %call.session_id, "tool call");
    let result = state.dispatcher.call(call).await;
    Json(result)
}
