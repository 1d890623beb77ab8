//! In-memory Home Assistant state cache, with an optional Redis write-through
//! for surviving restarts. The in-memory map is the source of truth the
//! resolver and dispatcher query synchronously; Redis is best-effort.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tg_domain::entity::StateCacheEntry;

pub struct StateCache {
    inner: RwLock<HashMap<String, StateCacheEntry>>,
    ttl: Duration,
    redis: Option<redis::aio::ConnectionManager>,
}

impl StateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            ttl,
            redis: None,
        }
    }

    pub async fn connect_redis(url: &str) -> Result<redis::aio::ConnectionManager, redis::RedisError> {
        let client = redis::Client::open(url)?;
        client.get_connection_manager().await
    }

    pub fn with_redis(ttl: Duration, conn: redis::aio::ConnectionManager) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            ttl,
            redis: Some(conn),
        }
    }

    fn ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::max_value())
    }

    /// Returns the cached entry only if it is still within `ttl`.
    pub fn get(&self, entity_id: &str) -> Option<StateCacheEntry> {
        let guard = self.inner.read();
        let entry = guard.get(entity_id)?;
        if entry.is_fresh(self.ttl_chrono(), Utc::now()) {
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Returns the cached entry regardless of freshness (used by the
    /// resolver, which operates on names rather than fresh state).
    pub fn get_stale(&self, entity_id: &str) -> Option<StateCacheEntry> {
        self.inner.read().get(entity_id).cloned()
    }

    pub fn all(&self) -> Vec<StateCacheEntry> {
        self.inner.read().values().cloned().collect()
    }

    /// Write-through: updates the in-memory map immediately, then pushes to
    /// Redis in the background if configured. Never blocks the caller on
    /// Redis latency.
    pub fn put(self: &Arc<Self>, entry: StateCacheEntry) {
        self.inner
            .write()
            .insert(entry.entity_id.clone(), entry.clone());

        if self.redis.is_some() {
            let this = Arc::clone(self);
            tokio::spawn(async move {
                this.push_to_redis(&entry).await;
            });
        }
    }

    pub fn invalidate(&self, entity_id: &str) {
        self.inner.write().remove(entity_id);
    }

    pub fn stale_entries(&self, now: chrono::DateTime<Utc>) -> Vec<String> {
        let ttl = self.ttl_chrono();
        self.inner
            .read()
            .values()
            .filter(|e| !e.is_fresh(ttl, now))
            .map(|e| e.entity_id.clone())
            .collect()
    }

    async fn push_to_redis(&self, entry: &StateCacheEntry) {
        let Some(conn) = &self.redis else { return };
        let mut conn = conn.clone();
        let key = format!("ha_state:{}", entry.entity_id);
        let payload = match serde_json::to_string(entry) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(entity_id = %entry.entity_id, error = %e, "failed to serialize cache entry for redis");
                return;
            }
        };
        let ttl_secs = self.ttl.as_secs().max(1);
        let result: Result<(), redis::RedisError> = redis::cmd("SET")
            .arg(&key)
            .arg(&payload)
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await;
        if let Err(e) = result {
            tracing::warn!(entity_id = %entry.entity_id, error = %e, "redis write-through failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, fetched_at: chrono::DateTime<Utc>) -> StateCacheEntry {
        StateCacheEntry {
            entity_id: id.into(),
            state: "on".into(),
            attributes: Default::default(),
            last_changed: fetched_at,
            fetched_at,
        }
    }

    #[test]
    fn fresh_entry_is_returned() {
        let cache = StateCache::new(Duration::from_secs(30));
        let e = entry("light.kitchen", Utc::now());
        cache.inner.write().insert(e.entity_id.clone(), e.clone());
        assert!(cache.get("light.kitchen").is_some());
    }

    #[test]
    fn stale_entry_is_filtered_out() {
        let cache = StateCache::new(Duration::from_secs(30));
        let old = Utc::now() - chrono::Duration::seconds(60);
        let e = entry("light.kitchen", old);
        cache.inner.write().insert(e.entity_id.clone(), e);
        assert!(cache.get("light.kitchen").is_none());
        assert!(cache.get_stale("light.kitchen").is_some());
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = StateCache::new(Duration::from_secs(30));
        let e = entry("switch.fan", Utc::now());
        cache.inner.write().insert(e.entity_id.clone(), e);
        cache.invalidate("switch.fan");
        assert!(cache.get_stale("switch.fan").is_none());
    }
}
