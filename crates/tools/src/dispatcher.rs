//! The tool dispatcher: validate → timeout-bounded call → uniform
//! [`ToolResult`]. This is the only way a [`ToolCall`] turns into a result;
//! every error path maps onto the closed [`ErrorKind`] set (spec §7).

use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tg_domain::tool::{ErrorKind, ToolCall, ToolResult};

use crate::registry::ToolRegistry;
use crate::validate::validate_arguments;

pub struct Dispatcher {
    registry: ToolRegistry,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn list_tools(&self) -> Vec<tg_domain::tool::ToolDescriptor> {
        self.registry.list()
    }

    pub async fn call(&self, call: ToolCall) -> ToolResult {
        let Some(descriptor) = self.registry.descriptor(&call.tool_name) else {
            tracing::warn!(tool = %call.tool_name, "unknown tool requested");
            return ToolResult::err(
                ErrorKind::UnknownTool,
                format!("no such tool: {}", call.tool_name),
            );
        };

        if let Err(reason) = validate_arguments(descriptor, &call.arguments) {
            tracing::warn!(tool = %call.tool_name, reason = %reason, "invalid arguments");
            return ToolResult::err(ErrorKind::InvalidArguments, reason);
        }

        // Both were proven present by `descriptor`'s existence above.
        let effector = self.registry.effector(&call.tool_name).unwrap();
        let timeout = self.registry.timeout(&call.tool_name).unwrap();

        let call_future = AssertUnwindSafe(effector.call(call.arguments.clone())).catch_unwind();
        match tokio::time::timeout(timeout, call_future).await {
            Ok(Ok(Ok(data))) => {
                tracing::info!(tool = %call.tool_name, session_id = %call.session_id, "tool call succeeded");
                ToolResult::ok(data)
            }
            Ok(Ok(Err(failure))) => {
                tracing::warn!(
                    tool = %call.tool_name,
                    session_id = %call.session_id,
                    kind = ?failure.kind,
                    message = %failure.message,
                    "tool call failed"
                );
                match failure.detail {
                    Some(detail) => {
                        ToolResult::err_with_detail(failure.kind, failure.message, detail)
                    }
                    None => ToolResult::err(failure.kind, failure.message),
                }
            }
            Ok(Err(_panic)) => {
                tracing::error!(tool = %call.tool_name, session_id = %call.session_id, "tool handler panicked");
                ToolResult::err(
                    ErrorKind::EffectorFailed,
                    format!("{} panicked", call.tool_name),
                )
            }
            Err(_elapsed) => {
                tracing::warn!(tool = %call.tool_name, timeout_ms = timeout.as_millis() as u64, "tool call timed out");
                ToolResult::err(
                    ErrorKind::EffectorTimeout,
                    format!("{} timed out after {}ms", call.tool_name, timeout.as_millis()),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effector::{Effector, EffectorResult, ToolFailure};
    use crate::registry::ToolRegistry;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tg_domain::tool::ToolDescriptor;

    struct Echo;
    #[async_trait::async_trait]
    impl Effector for Echo {
        async fn call(&self, arguments: Value) -> EffectorResult {
            Ok(arguments)
        }
    }

    struct AlwaysFails;
    #[async_trait::async_trait]
    impl Effector for AlwaysFails {
        async fn call(&self, _arguments: Value) -> EffectorResult {
            Err(ToolFailure::failed("boom"))
        }
    }

    struct NeverReturns;
    #[async_trait::async_trait]
    impl Effector for NeverReturns {
        async fn call(&self, _arguments: Value) -> EffectorResult {
            std::future::pending().await
        }
    }

    struct Panics;
    #[async_trait::async_trait]
    impl Effector for Panics {
        async fn call(&self, _arguments: Value) -> EffectorResult {
            panic!("effector exploded");
        }
    }

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor {
            name: name.into(),
            description: "".into(),
            parameters: json!({"type": "object", "required": ["x"]}),
        }
    }

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall {
            tool_name: name.into(),
            arguments: args,
            session_id: "s1".into(),
        }
    }

    #[tokio::test]
    async fn unknown_tool_returns_unknown_tool_kind() {
        let dispatcher = Dispatcher::new(ToolRegistry::builder().build());
        let result = dispatcher.call(call("nope", json!({}))).await;
        match result {
            ToolResult::Error { kind, .. } => assert_eq!(kind, ErrorKind::UnknownTool),
            _ => panic!("expected error"),
        }
    }

    #[tokio::test]
    async fn missing_required_argument_is_invalid_arguments() {
        let registry = ToolRegistry::builder()
            .register(descriptor("echo"), Duration::from_secs(1), Echo)
            .build();
        let dispatcher = Dispatcher::new(registry);
        let result = dispatcher.call(call("echo", json!({}))).await;
        match result {
            ToolResult::Error { kind, .. } => assert_eq!(kind, ErrorKind::InvalidArguments),
            _ => panic!("expected error"),
        }
    }

    #[tokio::test]
    async fn successful_call_returns_success() {
        let registry = ToolRegistry::builder()
            .register(descriptor("echo"), Duration::from_secs(1), Echo)
            .build();
        let dispatcher = Dispatcher::new(registry);
        let result = dispatcher.call(call("echo", json!({"x": 1}))).await;
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn effector_failure_is_propagated() {
        let registry = ToolRegistry::builder()
            .register(descriptor("fail"), Duration::from_secs(1), AlwaysFails)
            .build();
        let dispatcher = Dispatcher::new(registry);
        let result = dispatcher.call(call("fail", json!({"x": 1}))).await;
        match result {
            ToolResult::Error { kind, message, .. } => {
                assert_eq!(kind, ErrorKind::EffectorFailed);
                assert_eq!(message, "boom");
            }
            _ => panic!("expected error"),
        }
    }

    #[tokio::test]
    async fn panicking_effector_is_caught_as_effector_failed() {
        let registry = ToolRegistry::builder()
            .register(descriptor("panics"), Duration::from_secs(1), Panics)
            .build();
        let dispatcher = Dispatcher::new(registry);
        let result = dispatcher.call(call("panics", json!({"x": 1}))).await;
        match result {
            ToolResult::Error { kind, .. } => assert_eq!(kind, ErrorKind::EffectorFailed),
            _ => panic!("expected error"),
        }
    }

    #[tokio::test]
    async fn slow_effector_times_out() {
        let registry = ToolRegistry::builder()
            .register(descriptor("slow"), Duration::from_millis(10), NeverReturns)
            .build();
        let dispatcher = Dispatcher::new(registry);
        let result = dispatcher.call(call("slow", json!({"x": 1}))).await;
        match result {
            ToolResult::Error { kind, .. } => assert_eq!(kind, ErrorKind::EffectorTimeout),
            _ => panic!("expected error"),
        }
    }
}
