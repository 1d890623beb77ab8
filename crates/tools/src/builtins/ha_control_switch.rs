use std::sync::Arc;

use serde_json::json;
use tg_domain::tool::ErrorKind;
use tg_ha_sync::{HaSynchronizer, ResolveResult};

use crate::effector::{Effector, EffectorResult, ToolFailure};

/// Controls a switch by name or entity_id. A filter under three tokens is
/// room-level intent and actuates every match; three or more tokens narrows
/// to a single best candidate (spec §4.2).
pub struct HaControlSwitch {
    pub sync: Arc<HaSynchronizer>,
}

#[async_trait::async_trait]
impl Effector for HaControlSwitch {
    async fn call(&self, arguments: serde_json::Value) -> EffectorResult {
        if !self.sync.is_configured() {
            return Err(ToolFailure::unavailable(
                "Home Assistant is not configured",
            ));
        }

        let action = arguments
            .get("action")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolFailure::new(ErrorKind::InvalidArguments, "missing \"action\""))?;
        if !matches!(action, "turn_on" | "turn_off" | "toggle") {
            return Err(ToolFailure::new(
                ErrorKind::InvalidArguments,
                format!("\"action\" must be one of turn_on, turn_off, toggle, got \"{action}\""),
            ));
        }

        if let Some(id) = arguments.get("entity_id").and_then(|v| v.as_str()) {
            self.sync
                .control_switch(id, action)
                .await
                .map_err(|e| ToolFailure::unavailable(e.to_string()))?;
            return Ok(json!({ "entity_id": id, "action": action, "count": 1 }));
        }

        let Some(query) = arguments.get("query").and_then(|v| v.as_str()) else {
            return Err(ToolFailure::new(
                ErrorKind::InvalidArguments,
                "either \"entity_id\" or \"query\" is required",
            ));
        };

        let matched = match self.sync.resolve(query, "switch") {
            ResolveResult::Unique(e) => vec![e],
            ResolveResult::Multiple(es) => es,
            ResolveResult::NotFound => {
                return Err(ToolFailure::failed(format!(
                    "no switch matching \"{query}\""
                )))
            }
        };

        let mut actuated = Vec::with_capacity(matched.len());
        for entry in &matched {
            self.sync
                .control_switch(&entry.entity_id, action)
                .await
                .map_err(|e| ToolFailure::unavailable(e.to_string()))?;
            actuated.push(entry.entity_id.clone());
        }

        Ok(json!({
            "entity_ids": actuated,
            "action": action,
            "count": actuated.len(),
        }))
    }
}
