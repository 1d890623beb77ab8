pub mod chat;
pub mod feedback;
pub mod health;
pub mod tools;
pub mod transcribe;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/tools", get(tools::list_tools))
        .route("/chat", post(chat::chat))
        .route("/test-tool", post(tools::test_tool))
        .route("/feedback", post(feedback::feedback))
        .route(
            "/interaction/:session_id/:interaction_id",
            get(feedback::get_interaction),
        )
        .route("/transcribe", post(transcribe::transcribe))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
