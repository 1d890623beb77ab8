use std::sync::Arc;

use serde_json::json;
use tg_domain::entity::StateCacheEntry;
use tg_domain::tool::ErrorKind;
use tg_ha_sync::{HaSynchronizer, ResolveResult};

use crate::effector::{Effector, EffectorResult, ToolFailure};

pub struct HaGetDeviceState {
    pub sync: Arc<HaSynchronizer>,
}

#[async_trait::async_trait]
impl Effector for HaGetDeviceState {
    async fn call(&self, arguments: serde_json::Value) -> EffectorResult {
        if !self.sync.is_configured() {
            return Err(ToolFailure::unavailable(
                "Home Assistant is not configured",
            ));
        }

        if let Some(entity_id) = arguments.get("entity_id").and_then(|v| v.as_str()) {
            let entry = self
                .sync
                .get_state(entity_id)
                .await
                .ok_or_else(|| ToolFailure::failed(format!("unknown entity: {entity_id}")))?;
            return Ok(render_one(&entry));
        }

        let domain = arguments.get("domain").and_then(|v| v.as_str());
        let query = arguments.get("query").and_then(|v| v.as_str());

        if let Some(domain) = domain {
            let entries = self
                .sync
                .list(Some(domain), query)
                .await
                .map_err(|e| ToolFailure::unavailable(e.to_string()))?;
            return Ok(render_many(entries));
        }

        let Some(query) = query else {
            return Err(ToolFailure::new(
                ErrorKind::InvalidArguments,
                "one of \"entity_id\", \"domain\", or \"query\" is required",
            ));
        };

        match self.sync.resolve_any(query) {
            ResolveResult::Unique(e) => Ok(render_one(&e)),
            ResolveResult::Multiple(es) => Ok(render_many(es)),
            ResolveResult::NotFound => Err(ToolFailure::failed(format!(
                "no device matching \"{query}\""
            ))),
        }
    }
}

fn render_one(entry: &StateCacheEntry) -> serde_json::Value {
    json!({
        "entity_id": entry.entity_id,
        "state": entry.state,
        "attributes": entry.attributes,
        "last_changed": entry.last_changed,
    })
}

fn render_many(entries: Vec<StateCacheEntry>) -> serde_json::Value {
    let count = entries.len();
    let rendered: Vec<serde_json::Value> = entries.iter().map(render_one).collect();
    json!({ "entities": rendered, "count": count })
}
