//! Wire-level tool types shared by the dispatcher, router, and both HTTP
//! surfaces. These are the contract in spec §3/§6 — keep them stable.

use serde::{Deserialize, Serialize};

/// Describes a callable tool. Immutable once published by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    /// JSON-schema-shaped object declaring required/optional keys and types.
    pub parameters: serde_json::Value,
}

/// A single call into the dispatcher. Ephemeral — never persisted on its own,
/// only as part of an [`crate::interaction::Interaction`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    pub arguments: serde_json::Value,
    pub session_id: String,
}

/// Closed set of error kinds a [`ToolResult`] may carry. No other kind is
/// ever returned from the dispatcher (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownTool,
    InvalidArguments,
    EffectorUnavailable,
    EffectorTimeout,
    EffectorFailed,
    UpstreamRejected,
}

/// The uniform shape every `call()` returns: success-with-data xor
/// error-with-kind, never both, never neither (P1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResult {
    Success {
        data: serde_json::Value,
    },
    Error {
        kind: ErrorKind,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<serde_json::Value>,
    },
}

impl ToolResult {
    pub fn ok(data: serde_json::Value) -> Self {
        ToolResult::Success { data }
    }

    pub fn err(kind: ErrorKind, message: impl Into<String>) -> Self {
        ToolResult::Error {
            kind,
            message: message.into(),
            detail: None,
        }
    }

    pub fn err_with_detail(
        kind: ErrorKind,
        message: impl Into<String>,
        detail: serde_json::Value,
    ) -> Self {
        ToolResult::Error {
            kind,
            message: message.into(),
            detail: Some(detail),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_round_trips_through_json() {
        let r = ToolResult::ok(serde_json::json!({"x": 1}));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["x"], 1);
    }

    #[test]
    fn error_round_trips_through_json() {
        let r = ToolResult::err(ErrorKind::UnknownTool, "no such tool");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "unknown_tool");
        assert!(json.get("detail").is_none());
    }
}
