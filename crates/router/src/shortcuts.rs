//! Shortcut routing: a small set of regexes that bypass the LLM entirely for
//! obviously-mechanical requests ("what time is it", "ping 8.8.8.8"). Pure
//! policy — no I/O, easy to unit test.

use regex::Regex;
use serde_json::Value;

pub struct ShortcutRule {
    pub name: &'static str,
    pattern: Regex,
    build_args: fn(&regex::Captures) -> Value,
    tool_name: &'static str,
}

pub struct ShortcutMatch {
    pub tool_name: String,
    pub arguments: Value,
}

pub struct ShortcutRules {
    rules: Vec<ShortcutRule>,
}

impl Default for ShortcutRules {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl ShortcutRules {
    pub fn new(rules: Vec<ShortcutRule>) -> Self {
        Self { rules }
    }

    /// Returns the first rule whose pattern matches `message`, if any.
    pub fn match_message(&self, message: &str) -> Option<ShortcutMatch> {
        for rule in &self.rules {
            if let Some(caps) = rule.pattern.captures(message) {
                return Some(ShortcutMatch {
                    tool_name: rule.tool_name.to_string(),
                    arguments: (rule.build_args)(&caps),
                });
            }
        }
        None
    }
}

fn default_rules() -> Vec<ShortcutRule> {
    vec![
        ShortcutRule {
            name: "time_query",
            pattern: Regex::new(r"(?i)^\s*what(?:'s| is) the (?:current )?time\??\s*$").unwrap(),
            tool_name: "get_network_time",
            build_args: |_| serde_json::json!({}),
        },
        ShortcutRule {
            name: "ping_host",
            pattern: Regex::new(r"(?i)^\s*ping\s+([A-Za-z0-9._-]{1,253})\s*$").unwrap(),
            tool_name: "ping_host",
            build_args: |caps| serde_json::json!({ "host": caps.get(1).map(|m| m.as_str()).unwrap_or("") }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_time_query() {
        let rules = ShortcutRules::default();
        let m = rules.match_message("What's the current time?").unwrap();
        assert_eq!(m.tool_name, "get_network_time");
    }

    #[test]
    fn matches_ping_with_hostname() {
        let rules = ShortcutRules::default();
        let m = rules.match_message("ping example.com").unwrap();
        assert_eq!(m.tool_name, "ping_host");
        assert_eq!(m.arguments["host"], "example.com");
    }

    #[test]
    fn does_not_match_conversational_text() {
        let rules = ShortcutRules::default();
        assert!(rules.match_message("can you tell me a joke about time?").is_none());
    }

    #[test]
    fn custom_rules_replace_defaults() {
        let custom = ShortcutRules::new(vec![]);
        assert!(custom.match_message("ping example.com").is_none());
    }
}
