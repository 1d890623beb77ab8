//! REST calls against the Home Assistant HTTP API: initial state bootstrap
//! and `call_service` writes. The WebSocket subscriber (see [`crate::ws`])
//! is the source of truth for ongoing state; REST is used for the initial
//! snapshot and for issuing service calls, with the same retry discipline
//! used elsewhere in this workspace for outbound HTTP.

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tg_domain::entity::Entity;
use tg_domain::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct HaRestClient {
    http: Client,
    base_url: String,
    token: String,
    max_retries: u32,
}

impl HaRestClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
            max_retries: 2,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.bearer_auth(&self.token)
    }

    async fn execute_with_retry(
        &self,
        endpoint: &str,
        build_request: impl Fn() -> RequestBuilder,
    ) -> Result<Response> {
        let mut last_err: Option<Error> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                tokio::time::sleep(backoff).await;
            }

            let start = Instant::now();
            let rb = self.decorate(build_request());
            let result = rb.send().await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    tracing::debug!(endpoint, status = status.as_u16(), duration_ms, "HA REST call");

                    if status.is_server_error() {
                        let body = resp.text().await.unwrap_or_default();
                        last_err = Some(Error::UpstreamRejected(format!(
                            "{endpoint} returned {status}: {body}"
                        )));
                        continue;
                    }

                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        return Err(Error::UpstreamRejected(format!(
                            "{endpoint} auth failed ({status})"
                        )));
                    }

                    if status.is_client_error() {
                        let body = resp.text().await.unwrap_or_default();
                        return Err(Error::UpstreamRejected(format!(
                            "{endpoint} returned {status}: {body}"
                        )));
                    }

                    return Ok(resp);
                }
                Err(e) => {
                    last_err = Some(from_reqwest(e));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::UpstreamRejected(format!("{endpoint}: all retries exhausted"))))
    }

    /// `GET /api/states` — full snapshot, used on startup and on periodic
    /// resync when the WebSocket connection has been down too long.
    pub async fn get_states(&self) -> Result<Vec<Entity>> {
        let url = self.url("/api/states");
        let resp = self
            .execute_with_retry("GET /api/states", || self.http.get(&url))
            .await?;
        let body = resp.text().await.map_err(from_reqwest)?;
        let raw: Vec<RawState> = serde_json::from_str(&body)?;
        Ok(raw.into_iter().map(RawState::into_entity).collect())
    }

    /// `GET /api/states/{entity_id}` — single-entity refetch, used after a
    /// write-through invalidation's settle delay.
    pub async fn get_state(&self, entity_id: &str) -> Result<Entity> {
        let url = self.url(&format!("/api/states/{entity_id}"));
        let resp = self
            .execute_with_retry(&format!("GET /api/states/{entity_id}"), || self.http.get(&url))
            .await?;
        let body = resp.text().await.map_err(from_reqwest)?;
        let raw: RawState = serde_json::from_str(&body)?;
        Ok(raw.into_entity())
    }

    /// `POST /api/services/{domain}/{service}` with a `{"entity_id": ...}`
    /// payload merged with any extra service data.
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        entity_id: &str,
        extra: serde_json::Value,
    ) -> Result<()> {
        let url = self.url(&format!("/api/services/{domain}/{service}"));
        let mut payload = extra;
        if let serde_json::Value::Object(ref mut map) = payload {
            map.insert(
                "entity_id".to_string(),
                serde_json::Value::String(entity_id.to_string()),
            );
        } else {
            payload = serde_json::json!({ "entity_id": entity_id });
        }

        self.execute_with_retry(&format!("POST /api/services/{domain}/{service}"), || {
            self.http.post(&url).json(&payload)
        })
        .await?;
        Ok(())
    }
}

/// Home Assistant's wire shape for `/api/states` entries.
#[derive(Debug, serde::Deserialize)]
struct RawState {
    entity_id: String,
    state: String,
    #[serde(default)]
    attributes: std::collections::HashMap<String, serde_json::Value>,
    last_changed: chrono::DateTime<chrono::Utc>,
}

impl RawState {
    fn into_entity(self) -> Entity {
        let friendly_name = self
            .attributes
            .get("friendly_name")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| self.entity_id.clone());

        Entity {
            entity_id: self.entity_id,
            friendly_name,
            state: self.state,
            attributes: self.attributes,
            last_changed: self.last_changed,
        }
    }
}

fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
