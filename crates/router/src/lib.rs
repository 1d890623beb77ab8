pub mod protocol;
pub mod shortcuts;

pub use protocol::UseToolCall;
pub use shortcuts::{ShortcutMatch, ShortcutRules};

use serde_json::Value;
use tg_domain::interaction::RoutingType;

/// What the router decided to do with an inbound user message.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingDecision {
    /// A shortcut regex matched; call the named tool directly, never
    /// touching the LLM.
    DirectShortcut { tool_name: String, arguments: Value },
    /// No shortcut matched; hand the message to the LLM with the tool
    /// catalog available via `USE_TOOL`.
    LlmWithTools,
}

impl RoutingDecision {
    pub fn routing_type(&self) -> RoutingType {
        match self {
            RoutingDecision::DirectShortcut { .. } => RoutingType::DirectShortcut,
            RoutingDecision::LlmWithTools => RoutingType::LlmWithTools,
        }
    }
}

pub struct Router {
    shortcuts: ShortcutRules,
}

impl Router {
    pub fn new(shortcuts: ShortcutRules) -> Self {
        Self { shortcuts }
    }

    pub fn route(&self, message: &str) -> RoutingDecision {
        match self.shortcuts.match_message(message) {
            Some(m) => RoutingDecision::DirectShortcut {
                tool_name: m.tool_name,
                arguments: m.arguments,
            },
            None => RoutingDecision::LlmWithTools,
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(ShortcutRules::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcut_match_routes_directly() {
        let router = Router::default();
        match router.route("ping example.com") {
            RoutingDecision::DirectShortcut { tool_name, .. } => {
                assert_eq!(tool_name, "ping_host")
            }
            other => panic!("expected DirectShortcut, got {other:?}"),
        }
    }

    #[test]
    fn non_shortcut_routes_to_llm() {
        let router = Router::default();
        assert_eq!(
            router.route("tell me about the weather"),
            RoutingDecision::LlmWithTools
        );
    }
}
