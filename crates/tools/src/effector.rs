//! The trait every registered tool implements, and the internal failure
//! type effectors raise before it is mapped onto the wire [`ErrorKind`].

use serde_json::Value;
use tg_domain::tool::ErrorKind;

#[derive(Debug, Clone)]
pub struct ToolFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub detail: Option<Value>,
}

impl ToolFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EffectorUnavailable, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EffectorFailed, message)
    }
}

pub type EffectorResult = Result<Value, ToolFailure>;

/// Implemented by every concrete tool effector. `call` receives already
/// validated arguments (see [`crate::validate`]) and returns either the
/// tool's JSON payload or a typed failure.
#[async_trait::async_trait]
pub trait Effector: Send + Sync + 'static {
    async fn call(&self, arguments: Value) -> EffectorResult;
}
