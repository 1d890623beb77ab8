use std::sync::Arc;

use serde_json::json;
use tg_domain::tool::ErrorKind;
use tg_ha_sync::{HaSynchronizer, ResolveResult};

use crate::effector::{Effector, EffectorResult, ToolFailure};

/// Controls a light by name or entity_id. Falls back to the switch domain
/// when no light matches (many smart plugs driving lamps register as
/// `switch.*`), per the device-control contract. A filter under three
/// tokens is room-level intent and actuates every match; three or more
/// tokens narrows to a single best candidate (spec §4.2).
pub struct HaControlLight {
    pub sync: Arc<HaSynchronizer>,
}

#[async_trait::async_trait]
impl Effector for HaControlLight {
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

        let brightness = match arguments.get("brightness") {
            Some(v) => {
                let n = v.as_i64().ok_or_else(|| {
                    ToolFailure::new(ErrorKind::InvalidArguments, "\"brightness\" must be an integer")
                })?;
                if !(0..=255).contains(&n) {
                    return Err(ToolFailure::new(
                        ErrorKind::InvalidArguments,
                        format!("\"brightness\" must be in [0, 255], got {n}"),
                    ));
                }
                Some(n as u8)
            }
            None => None,
        };

        if let Some(id) = arguments.get("entity_id").and_then(|v| v.as_str()) {
            self.sync
                .control_light(id, action, brightness)
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

        let matched = match self.sync.resolve_light_or_switch(query) {
            ResolveResult::Unique(e) => vec![e],
            ResolveResult::Multiple(es) => es,
            ResolveResult::NotFound => {
                return Err(ToolFailure::failed(format!(
                    "no light matching \"{query}\""
                )))
            }
        };

        let domain_actuated = matched[0].domain().to_string();
        let mut actuated = Vec::with_capacity(matched.len());
        for entry in &matched {
            let result = if entry.domain() == "light" {
                self.sync.control_light(&entry.entity_id, action, brightness).await
            } else {
                self.sync.control_switch(&entry.entity_id, action).await
            };
            result.map_err(|e| ToolFailure::unavailable(e.to_string()))?;
            actuated.push(entry.entity_id.clone());
        }

        Ok(json!({
            "entity_ids": actuated,
            "action": action,
            "count": actuated.len(),
            "domain_actuated": domain_actuated,
        }))
    }
}
