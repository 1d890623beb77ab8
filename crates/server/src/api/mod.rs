pub mod generate;
pub mod health;
pub mod tools;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/v1/tools/list", get(tools::list_tools))
        .route("/v1/tools/call", post(tools::call_tool))
        .route("/v1/generate", post(generate::generate))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
