use std::time::Duration;

use serde_json::json;
use tg_effectors::ping::{self, PingError};

use crate::effector::{Effector, EffectorResult, ToolFailure};
use tg_domain::tool::ErrorKind;

pub struct PingTool {
    pub default_count: u32,
    pub timeout: Duration,
}

impl Default for PingTool {
    fn default() -> Self {
        Self {
            default_count: 4,
            timeout: Duration::from_secs(5),
        }
    }
}

#[async_trait::async_trait]
impl Effector for PingTool {
    async fn call(&self, arguments: serde_json::Value) -> EffectorResult {
        let host = arguments
            .get("host")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolFailure::new(ErrorKind::InvalidArguments, "missing \"host\""))?;

        let count = arguments
            .get("count")
            .and_then(|v| v.as_u64())
            .map(|n| n as u32)
            .unwrap_or(self.default_count);

        match ping::ping(host, count, self.timeout).await {
            Ok(result) => Ok(json!({
                "host": result.host,
                "reachable": result.reachable,
                "avg_latency_ms": result.avg_latency_ms,
                "packet_loss_pct": result.packet_loss_pct,
                "raw_snippet": result.raw_snippet,
            })),
            Err(PingError::InvalidHostname(h)) => Err(ToolFailure::new(
                ErrorKind::InvalidArguments,
                format!("invalid hostname: {h}"),
            )),
            Err(PingError::Timeout(d)) => Err(ToolFailure::new(
                ErrorKind::EffectorTimeout,
                format!("ping timed out after {}ms", d.as_millis()),
            )),
            Err(PingError::Spawn(e)) => Err(ToolFailure::unavailable(format!(
                "could not run ping: {e}"
            ))),
        }
    }
}
