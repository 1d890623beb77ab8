//! `POST /transcribe` — multipart upload of a WAV clip (16 kHz / 16-bit /
//! mono per spec §6), bridged to the streaming transcoder over its
//! length-prefixed frame protocol (spec §4.3).

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use tg_domain::error::Error;

use crate::state::AppState;

const TRANSCRIBE_CHUNK_SIZE: usize = 4096;

pub async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let Some(whisper_url) = &state.config.whisper_url else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "WHISPER_URL not configured" })),
        )
            .into_response();
    };

    let mut audio: Option<Vec<u8>> = None;
    let mut session_id = "transcribe".to_string();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": e.to_string() })),
                )
                    .into_response()
            }
        };

        match field.name().unwrap_or("") {
            "session_id" => {
                if let Ok(text) = field.text().await {
                    session_id = text;
                }
            }
            _ => match field.bytes().await {
                Ok(bytes) => audio = Some(bytes.to_vec()),
                Err(e) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(serde_json::json!({ "error": e.to_string() })),
                    )
                        .into_response()
                }
            },
        }
    }

    let Some(audio) = audio else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "no audio field in multipart body" })),
        )
            .into_response();
    };

    match tg_transcribe::transcribe(whisper_url, &session_id, &audio, TRANSCRIBE_CHUNK_SIZE).await {
        Ok(text) => {
            let warning = if text.trim().is_empty() {
                Some("empty transcript".to_string())
            } else {
                None
            };
            Json(serde_json::json!({ "text": text, "warning": warning })).into_response()
        }
        Err(e @ Error::Timeout(_)) => (
            StatusCode::GATEWAY_TIMEOUT,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
