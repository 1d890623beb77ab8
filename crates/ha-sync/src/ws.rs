//! WebSocket subscriber for Home Assistant's `/api/websocket` event stream.
//! Authenticates, subscribes to `state_changed`, and keeps [`StateCache`]
//! current for as long as the process runs, reconnecting with backoff on
//! any disconnect.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use tg_domain::entity::StateCacheEntry;

use crate::cache::StateCache;
use crate::reconnect::ReconnectBackoff;
use crate::status::ConnectionStatus;

pub struct HaSubscriber {
    ws_url: String,
    token: String,
    backoff: ReconnectBackoff,
    status: Arc<ConnectionStatus>,
}

impl HaSubscriber {
    pub fn new(ws_url: String, token: String, status: Arc<ConnectionStatus>) -> Self {
        Self {
            ws_url,
            token,
            backoff: ReconnectBackoff::default(),
            status,
        }
    }

    /// Runs until `shutdown` is cancelled. Never returns `Err` under normal
    /// operation — connection failures are retried per `backoff`, logged,
    /// and swallowed, matching the synchronizer's "never take the gateway
    /// down because Home Assistant hiccuped" contract.
    pub async fn run(self, cache: Arc<StateCache>, shutdown: CancellationToken) {
        let mut attempt: u32 = 0;

        loop {
            if shutdown.is_cancelled() {
                return;
            }

            let result = tokio::select! {
                r = self.connect_and_run(&cache) => r,
                _ = shutdown.cancelled() => {
                    tracing::info!("HA subscriber shutdown requested");
                    return;
                }
            };

            self.status.set_disconnected();

            match result {
                Ok(authenticated) => {
                    tracing::info!(authenticated, "HA websocket connection closed");
                    if authenticated {
                        attempt = 0;
                    }
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "HA websocket connection lost");
                }
            }

            if self.backoff.should_give_up(attempt) {
                tracing::error!(attempts = attempt, "giving up on HA websocket reconnect");
                return;
            }

            let delay = self.backoff.delay_for_attempt(attempt);
            tracing::info!(delay_ms = delay.as_millis() as u64, "reconnecting to Home Assistant");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.cancelled() => return,
            }

            attempt += 1;
        }
    }

    /// Returns `Ok(true)` if auth succeeded before the connection closed.
    async fn connect_and_run(&self, cache: &Arc<StateCache>) -> Result<bool, String> {
        tracing::info!(url = %self.ws_url, "connecting to Home Assistant");
        let (ws, _) = tokio_tungstenite::connect_async(&self.ws_url)
            .await
            .map_err(|e| e.to_string())?;
        let (mut sink, mut stream) = ws.split();

        // HA sends `auth_required` first.
        let first = next_json(&mut stream).await?;
        match first.get("type").and_then(Value::as_str) {
            Some("auth_required") => {}
            other => return Err(format!("unexpected first message: {other:?}")),
        }

        sink.send(Message::Text(
            json!({ "type": "auth", "access_token": self.token }).to_string(),
        ))
        .await
        .map_err(|e| e.to_string())?;

        let auth_result = next_json(&mut stream).await?;
        match auth_result.get("type").and_then(Value::as_str) {
            Some("auth_ok") => {}
            Some("auth_invalid") => return Err("Home Assistant rejected our access token".into()),
            other => return Err(format!("unexpected auth response: {other:?}")),
        }

        tracing::info!("authenticated with Home Assistant");
        self.status.set_connected();

        sink.send(Message::Text(
            json!({ "id": 1, "type": "subscribe_events", "event_type": "state_changed" })
                .to_string(),
        ))
        .await
        .map_err(|e| e.to_string())?;

        let sub_ack = next_json(&mut stream).await?;
        if sub_ack.get("success").and_then(Value::as_bool) != Some(true) {
            return Err(format!("subscribe_events rejected: {sub_ack}"));
        }

        while let Some(msg) = stream.next().await {
            let msg = match msg {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!(error = %e, "HA websocket read error");
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    if let Ok(event) = serde_json::from_str::<Value>(&text) {
                        handle_event(cache, &event);
                    }
                }
                Message::Close(_) => {
                    tracing::info!("Home Assistant closed the websocket");
                    break;
                }
                _ => {}
            }
        }

        Ok(true)
    }
}

async fn next_json<S>(stream: &mut S) -> Result<Value, String>
where
    S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
        + Unpin,
{
    let wait = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(msg) = stream.next().await {
            if let Ok(Message::Text(text)) = msg {
                return serde_json::from_str::<Value>(&text).map_err(|e| e.to_string());
            }
        }
        Err("connection closed before expected message".to_string())
    });
    wait.await
        .map_err(|_| "timed out waiting for message".to_string())?
}

#[derive(Deserialize)]
struct StateChangedEvent {
    event: EventEnvelope,
}

#[derive(Deserialize)]
struct EventEnvelope {
    event_type: String,
    data: StateChangedData,
}

#[derive(Deserialize)]
struct StateChangedData {
    entity_id: String,
    new_state: Option<NewState>,
}

#[derive(Deserialize)]
struct NewState {
    state: String,
    #[serde(default)]
    attributes: std::collections::HashMap<String, Value>,
    last_changed: chrono::DateTime<Utc>,
}

fn handle_event(cache: &Arc<StateCache>, raw: &Value) {
    if raw.get("type").and_then(Value::as_str) != Some("event") {
        return;
    }

    let parsed: StateChangedEvent = match serde_json::from_value(raw.clone()) {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse HA event envelope");
            return;
        }
    };

    if parsed.event.event_type != "state_changed" {
        return;
    }

    let Some(new_state) = parsed.event.data.new_state else {
        // Entity removed; stop serving stale cached state for it.
        cache.invalidate(&parsed.event.data.entity_id);
        return;
    };

    let entry = StateCacheEntry {
        entity_id: parsed.event.data.entity_id.clone(),
        state: new_state.state,
        attributes: new_state.attributes,
        last_changed: new_state.last_changed,
        fetched_at: Utc::now(),
    };

    tracing::debug!(entity_id = %entry.entity_id, state = %entry.state, "HA state update");
    cache.put(entry);
}
