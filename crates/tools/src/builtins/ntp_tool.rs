use serde_json::json;
use tg_effectors::NtpEffector;

use crate::effector::{Effector, EffectorResult};

pub struct NtpTool {
    effector: NtpEffector,
}

impl NtpTool {
    pub fn new(effector: NtpEffector) -> Self {
        Self { effector }
    }
}

#[async_trait::async_trait]
impl Effector for NtpTool {
    async fn call(&self, _arguments: serde_json::Value) -> EffectorResult {
        let result = self.effector.get_time().await;
        Ok(json!({
            "timestamp": result.timestamp,
            "source": result.source,
            "warning": result.warning,
        }))
    }
}
