//! `POST /feedback` and `GET /interaction/{session_id}/{interaction_id}` —
//! spec §4.4/§6.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use tg_domain::interaction::Feedback;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub interaction_id: String,
    pub session_id: String,
    pub feedback: Feedback,
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> impl IntoResponse {
    let Some(service) = &state.feedback else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "error": "feedback store not configured (REDIS_HOST/MYSQL_* unset)",
            })),
        )
            .into_response();
    };

    match service
        .apply(
            &request.session_id,
            &request.interaction_id,
            request.feedback,
            request.reason,
        )
        .await
    {
        Ok(()) => Json(serde_json::json!({ "status": "ok" })).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, interaction_id = %request.interaction_id, "feedback apply failed");
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

pub async fn get_interaction(
    State(state): State<AppState>,
    Path((session_id, interaction_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let Some(service) = &state.feedback else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "error": "feedback store not configured (REDIS_HOST/MYSQL_* unset)",
            })),
        )
            .into_response();
    };

    match service.get(&session_id, &interaction_id).await {
        Ok(Some(interaction)) => Json(interaction).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "interaction not found" })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
