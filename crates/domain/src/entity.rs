//! Home Assistant read-model types (spec §3, §4.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A Home Assistant entity as reported by the hub. Created and updated by
/// HA; never destroyed locally, only evicted from cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: String,
    pub friendly_name: String,
    pub state: String,
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
    pub last_changed: DateTime<Utc>,
}

impl Entity {
    /// The `domain` prefix before the dot, e.g. `light` in `light.kitchen`.
    pub fn domain(&self) -> &str {
        self.entity_id.split('.').next().unwrap_or("")
    }
}

/// A single cache row: state HA reported or HA acknowledged writing, plus
/// the time it was observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateCacheEntry {
    pub entity_id: String,
    pub state: String,
    pub attributes: HashMap<String, serde_json::Value>,
    pub last_changed: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
}

impl StateCacheEntry {
    pub fn from_entity(entity: Entity, fetched_at: DateTime<Utc>) -> Self {
        Self {
            entity_id: entity.entity_id,
            state: entity.state,
            attributes: entity.attributes,
            last_changed: entity.last_changed,
            fetched_at,
        }
    }

    pub fn domain(&self) -> &str {
        self.entity_id.split('.').next().unwrap_or("")
    }

    pub fn is_fresh(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.fetched_at) < ttl
    }

    /// The `attributes.friendly_name` HA reports, falling back to the
    /// entity_id's object-id segment (the part after the dot) when absent.
    pub fn friendly_name(&self) -> String {
        match self.attributes.get("friendly_name").and_then(|v| v.as_str()) {
            Some(name) => name.to_string(),
            None => self
                .entity_id
                .split('.')
                .nth(1)
                .unwrap_or(&self.entity_id)
                .replace('_', " "),
        }
    }
}
