//! Immutable-after-construction tool registry: descriptor + effector +
//! per-tool timeout, keyed by tool name.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tg_domain::tool::ToolDescriptor;

use crate::effector::Effector;

struct RegisteredTool {
    descriptor: ToolDescriptor,
    effector: Arc<dyn Effector>,
    timeout: Duration,
}

/// Built via [`ToolRegistryBuilder`] and never mutated afterward — §5's
/// "registry is immutable after `Dispatcher::new`" invariant.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<HashMap<String, RegisteredTool>>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    pub fn descriptor(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name).map(|t| &t.descriptor)
    }

    pub fn effector(&self, name: &str) -> Option<Arc<dyn Effector>> {
        self.tools.get(name).map(|t| Arc::clone(&t.effector))
    }

    pub fn timeout(&self, name: &str) -> Option<Duration> {
        self.tools.get(name).map(|t| t.timeout)
    }

    pub fn list(&self) -> Vec<ToolDescriptor> {
        let mut names: Vec<&String> = self.tools.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|n| self.tools[n].descriptor.clone())
            .collect()
    }
}

#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistryBuilder {
    pub fn register(
        mut self,
        descriptor: ToolDescriptor,
        timeout: Duration,
        effector: impl Effector,
    ) -> Self {
        let name = descriptor.name.clone();
        self.tools.insert(
            name,
            RegisteredTool {
                descriptor,
                effector: Arc::new(effector),
                timeout,
            },
        );
        self
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            tools: Arc::new(self.tools),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    struct Echo;
    #[async_trait::async_trait]
    impl Effector for Echo {
        async fn call(&self, arguments: Value) -> crate::effector::EffectorResult {
            Ok(arguments)
        }
    }

    #[test]
    fn lists_tools_sorted_by_name() {
        let registry = ToolRegistry::builder()
            .register(
                ToolDescriptor {
                    name: "z_tool".into(),
                    description: "".into(),
                    parameters: json!({}),
                },
                Duration::from_secs(1),
                Echo,
            )
            .register(
                ToolDescriptor {
                    name: "a_tool".into(),
                    description: "".into(),
                    parameters: json!({}),
                },
                Duration::from_secs(1),
                Echo,
            )
            .build();

        let names: Vec<String> = registry.list().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["a_tool", "z_tool"]);
    }

    #[test]
    fn unknown_tool_has_no_descriptor() {
        let registry = ToolRegistry::builder().build();
        assert!(registry.descriptor("missing").is_none());
    }
}
