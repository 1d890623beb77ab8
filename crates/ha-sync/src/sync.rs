//! Top-level Home Assistant synchronizer: owns the cache, the REST client,
//! and the WebSocket subscriber task. This is the only thing that writes to
//! [`StateCache`] — everything else (the fuzzy resolver, the dispatcher)
//! only reads it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use tg_domain::config::HomeAssistantConfig;
use tg_domain::entity::StateCacheEntry;
use tg_domain::error::{Error, Result};

use crate::cache::StateCache;
use crate::fuzzy::{self, ResolveResult};
use crate::rest::HaRestClient;
use crate::status::ConnectionStatus;
use crate::ws::HaSubscriber;

/// How long to wait after issuing a service call before refetching the
/// entity's authoritative state (spec §4.2's "bounded settle delay"). Home
/// Assistant applies most device commands asynchronously; refetching
/// immediately would very often just re-read the pre-command state.
const SETTLE_DELAY: Duration = Duration::from_millis(500);

pub struct HaSynchronizer {
    cache: Arc<StateCache>,
    rest: Option<HaRestClient>,
    ws_url: Option<String>,
    token: Option<String>,
    status: Arc<ConnectionStatus>,
}

impl HaSynchronizer {
    pub fn new(config: &HomeAssistantConfig, redis: Option<redis::aio::ConnectionManager>) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_secs);
        let cache = Arc::new(match redis {
            Some(conn) => StateCache::with_redis(ttl, conn),
            None => StateCache::new(ttl),
        });
        let status = Arc::new(ConnectionStatus::new());

        if !config.is_configured() {
            return Self {
                cache,
                rest: None,
                ws_url: None,
                token: None,
                status,
            };
        }

        let url = config.url.clone().unwrap();
        let token = config.token.clone().unwrap();
        let rest = HaRestClient::new(&url, &token, Duration::from_secs(10)).ok();

        Self {
            cache,
            rest,
            ws_url: config.ws_url(),
            token: Some(token),
            status,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.rest.is_some() && self.ws_url.is_some()
    }

    /// One of `not_configured|configured|connected|disconnected` (spec §6).
    pub fn connection_status(&self) -> &'static str {
        if !self.is_configured() {
            return "not_configured";
        }
        self.status.as_str()
    }

    pub fn cache(&self) -> Arc<StateCache> {
        Arc::clone(&self.cache)
    }

    /// `GET /api/states` once, to prime the cache before the websocket
    /// subscriber has delivered any events.
    pub async fn bootstrap(&self) -> Result<usize> {
        let Some(rest) = &self.rest else {
            return Ok(0);
        };
        let entities = rest.get_states().await?;
        let now = Utc::now();
        let count = entities.len();
        for entity in entities {
            self.cache.put(StateCacheEntry::from_entity(entity, now));
        }
        tracing::info!(count, "primed Home Assistant state cache");
        Ok(count)
    }

    /// Spawn the websocket subscriber as a background task. Returns `None`
    /// if Home Assistant isn't configured.
    pub fn spawn_subscriber(&self, shutdown: CancellationToken) -> Option<JoinHandle<()>> {
        let ws_url = self.ws_url.clone()?;
        let token = self.token.clone()?;
        let cache = self.cache();
        let subscriber = HaSubscriber::new(ws_url, token, self.status.clone());
        Some(tokio::spawn(async move {
            subscriber.run(cache, shutdown).await;
        }))
    }

    /// `get(entity_id)` per spec §4.2: a fresh cache hit returns directly,
    /// otherwise REST-fetch, cache, and return. Guarantees P3 — the read
    /// immediately following a successful `control()` observes the write.
    pub async fn get_state(&self, entity_id: &str) -> Option<StateCacheEntry> {
        if let Some(entry) = self.cache.get(entity_id) {
            return Some(entry);
        }

        let rest = self.rest.clone()?;
        match rest.get_state(entity_id).await {
            Ok(entity) => {
                let entry = StateCacheEntry::from_entity(entity, Utc::now());
                self.cache.put(entry.clone());
                Some(entry)
            }
            Err(e) => {
                tracing::warn!(entity_id = %entity_id, error = %e, "REST refetch failed on cache miss");
                None
            }
        }
    }

    /// `list(domain=?, name_filter=?)` per spec §4.2: REST-fetch the bulk
    /// state endpoint, cache each result, then apply the filters in memory.
    pub async fn list(
        &self,
        domain: Option<&str>,
        name_filter: Option<&str>,
    ) -> Result<Vec<StateCacheEntry>> {
        let rest = self
            .rest
            .clone()
            .ok_or_else(|| Error::Config("Home Assistant is not configured".into()))?;

        let entities = rest.get_states().await?;
        let now = Utc::now();
        let mut entries = Vec::with_capacity(entities.len());
        for entity in entities {
            let entry = StateCacheEntry::from_entity(entity, now);
            self.cache.put(entry.clone());
            entries.push(entry);
        }

        if let Some(domain) = domain {
            entries.retain(|e| e.domain() == domain);
        }
        if let Some(filter) = name_filter {
            let tokens = fuzzy::tokenize(filter);
            entries.retain(|e| {
                let haystack = fuzzy::normalize(&format!("{} {}", e.friendly_name(), e.entity_id));
                tokens.iter().all(|t| haystack.contains(t.as_str()))
            });
        }
        Ok(entries)
    }

    pub fn resolve(&self, query: &str, domain: &str) -> ResolveResult {
        let all = self.cache.all();
        fuzzy::resolve(query, &all, domain)
    }

    pub fn resolve_light_or_switch(&self, query: &str) -> ResolveResult {
        let all = self.cache.all();
        fuzzy::resolve_with_fallback(query, &all, "light", "switch")
    }

    pub fn resolve_any(&self, query: &str) -> ResolveResult {
        let all = self.cache.all();
        fuzzy::resolve_any(query, &all)
    }

    pub async fn control_light(&self, entity_id: &str, action: &str, brightness: Option<u8>) -> Result<()> {
        let mut extra = serde_json::json!({});
        if let Some(level) = brightness {
            extra = serde_json::json!({ "brightness": level });
        }
        self.control(entity_id, "light", action, extra).await
    }

    pub async fn control_switch(&self, entity_id: &str, action: &str) -> Result<()> {
        self.control(entity_id, "switch", action, serde_json::json!({}))
            .await
    }

    /// Control an already-resolved entity using whichever domain its
    /// `entity_id` actually belongs to (light or switch fallback may have
    /// resolved to either).
    pub async fn control_entity(&self, entity_id: &str, action: &str) -> Result<()> {
        let domain = entity_id.split('.').next().unwrap_or("");
        self.control(entity_id, domain, action, serde_json::json!({}))
            .await
    }

    /// Service call → invalidate → settle → refetch, all before returning,
    /// so that a reader observing state right after `control` returns sees
    /// the effect rather than a stale pre-write value (spec §4.2, P3).
    async fn control(
        &self,
        entity_id: &str,
        domain: &str,
        service: &str,
        extra: serde_json::Value,
    ) -> Result<()> {
        let rest = self
            .rest
            .clone()
            .ok_or_else(|| Error::Config("Home Assistant is not configured".into()))?;

        rest.call_service(domain, service, entity_id, extra).await?;

        // Write-through: drop the now-stale cached value immediately, then
        // refetch the authoritative state once HA has had time to settle.
        // If the refetch fails, the entry stays invalidated so the next
        // `get_state` call REST-fetches fresh rather than serving stale data.
        self.cache.invalidate(entity_id);
        tokio::time::sleep(SETTLE_DELAY).await;
        match rest.get_state(entity_id).await {
            Ok(entity) => {
                self.cache.put(StateCacheEntry::from_entity(entity, Utc::now()));
            }
            Err(e) => {
                tracing::warn!(entity_id = %entity_id, error = %e, "settle-delay refetch failed");
            }
        }

        Ok(())
    }
}
