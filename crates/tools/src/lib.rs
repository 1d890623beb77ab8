pub mod builtins;
pub mod dispatcher;
pub mod effector;
pub mod registry;
pub mod validate;

pub use dispatcher::Dispatcher;
pub use effector::{Effector, EffectorResult, ToolFailure};
pub use registry::ToolRegistry;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tg_domain::config::NtpConfig;
use tg_domain::tool::ToolDescriptor;
use tg_effectors::NtpEffector;
use tg_ha_sync::HaSynchronizer;

/// Builds the dispatcher for the five tools named in the registry: NTP time,
/// ping, and the three Home Assistant device tools.
pub fn build_default_dispatcher(ntp: &NtpConfig, ha_sync: Arc<HaSynchronizer>) -> Dispatcher {
    let ntp_timeout = Duration::from_millis(ntp.timeout_ms);
    let ntp_effector = NtpEffector::new(ntp.primary.clone(), ntp.backup.clone(), ntp_timeout);

    let registry = ToolRegistry::builder()
        .register(
            get_network_time_descriptor(),
            ntp_timeout * 2 + Duration::from_secs(1),
            builtins::NtpTool::new(ntp_effector),
        )
        .register(
            ping_host_descriptor(),
            Duration::from_secs(8),
            builtins::PingTool::default(),
        )
        .register(
            ha_get_device_state_descriptor(),
            Duration::from_secs(3),
            builtins::HaGetDeviceState {
                sync: Arc::clone(&ha_sync),
            },
        )
        .register(
            ha_control_light_descriptor(),
            Duration::from_secs(5),
            builtins::HaControlLight {
                sync: Arc::clone(&ha_sync),
            },
        )
        .register(
            ha_control_switch_descriptor(),
            Duration::from_secs(5),
            builtins::HaControlSwitch { sync: ha_sync },
        )
        .build();

    Dispatcher::new(registry)
}

fn get_network_time_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "get_network_time".into(),
        description: "Returns the current time from a network NTP server, falling back to the system clock if no NTP server is reachable.".into(),
        parameters: json!({ "type": "object", "properties": {} }),
    }
}

fn ping_host_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "ping_host".into(),
        description: "Pings a hostname or IP address and reports reachability, average latency, and packet loss.".into(),
        parameters: json!({
            "type": "object",
            "required": ["host"],
            "properties": {
                "host": {"type": "string", "description": "hostname or IP address to ping"},
                "count": {"type": "integer", "description": "number of echo requests to send"},
            },
        }),
    }
}

fn ha_get_device_state_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "ha_get_device_state".into(),
        description: "Looks up the current state of Home Assistant entities by entity_id, domain, or a fuzzy name query. A broad query or a bare domain may return more than one entity.".into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "entity_id": {"type": "string"},
                "domain": {"type": "string", "description": "restrict the lookup to one domain, e.g. \"light\""},
                "query": {"type": "string", "description": "loosely-phrased device name, e.g. \"kitchen lights\""},
            },
        }),
    }
}

fn ha_control_light_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "ha_control_light".into(),
        description: "Controls a Home Assistant light, identified by entity_id or a fuzzy name query. A broad query acts on every matching light.".into(),
        parameters: json!({
            "type": "object",
            "required": ["action"],
            "properties": {
                "entity_id": {"type": "string"},
                "query": {"type": "string"},
                "action": {"type": "string", "enum": ["turn_on", "turn_off", "toggle"]},
                "brightness": {"type": "integer", "minimum": 0, "maximum": 255},
            },
        }),
    }
}

fn ha_control_switch_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "ha_control_switch".into(),
        description: "Controls a Home Assistant switch, identified by entity_id or a fuzzy name query. A broad query acts on every matching switch.".into(),
        parameters: json!({
            "type": "object",
            "required": ["action"],
            "properties": {
                "entity_id": {"type": "string"},
                "query": {"type": "string"},
                "action": {"type": "string", "enum": ["turn_on", "turn_off", "toggle"]},
            },
        }),
    }
}
