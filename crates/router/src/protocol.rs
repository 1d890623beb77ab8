//! The `USE_TOOL:<name>:{json}` line-oriented protocol the LLM uses to
//! request a tool call instead of answering directly.

use serde_json::Value;

pub const PREFIX: &str = "USE_TOOL:";

#[derive(Debug, Clone, PartialEq)]
pub struct UseToolCall {
    pub tool_name: String,
    pub arguments: Value,
}

/// Parses a line of the form `USE_TOOL:tool_name:{"arg": 1}`. Returns `None`
/// if the line doesn't start with the prefix or the JSON payload is
/// malformed — callers should treat either as "not a tool call, fall
/// through to plain text".
pub fn parse(line: &str) -> Option<UseToolCall> {
    let rest = line.trim().strip_prefix(PREFIX)?;
    let (tool_name, json_part) = rest.split_once(':')?;
    let tool_name = tool_name.trim();
    if tool_name.is_empty() {
        return None;
    }
    let arguments: Value = serde_json::from_str(json_part.trim()).ok()?;
    Some(UseToolCall {
        tool_name: tool_name.to_string(),
        arguments,
    })
}

/// Formats a tool call back into the wire form, e.g. for echoing into the
/// interaction log's debug info.
pub fn format(tool_name: &str, arguments: &Value) -> String {
    format!("{PREFIX}{tool_name}:{arguments}")
}

/// Scans every line of an LLM response for `USE_TOOL:` calls, preserving
/// the order they appear in. Lines that don't parse are silently skipped —
/// callers that need to report parse failures should re-check lines that
/// start with [`PREFIX`] but aren't in the returned list.
pub fn parse_all(text: &str) -> Vec<UseToolCall> {
    text.lines().filter_map(parse).collect()
}

/// Lines that look like a tool call attempt (start with the prefix) but
/// failed to parse — used to populate `debug_info` with parse failures.
pub fn malformed_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with(PREFIX) && parse(line).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_well_formed_call() {
        let call = parse(r#"USE_TOOL:ping_host:{"host": "example.com"}"#).unwrap();
        assert_eq!(call.tool_name, "ping_host");
        assert_eq!(call.arguments, json!({"host": "example.com"}));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let call = parse("  USE_TOOL:get_network_time:{}  \n").unwrap();
        assert_eq!(call.tool_name, "get_network_time");
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!(parse(r#"ping_host:{"host": "x"}"#).is_none());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse("USE_TOOL:ping_host:{not json}").is_none());
    }

    #[test]
    fn rejects_empty_tool_name() {
        assert!(parse("USE_TOOL::{}").is_none());
    }

    #[test]
    fn format_round_trips() {
        let formatted = format("ping_host", &json!({"host": "example.com"}));
        let parsed = parse(&formatted).unwrap();
        assert_eq!(parsed.tool_name, "ping_host");
        assert_eq!(parsed.arguments, json!({"host": "example.com"}));
    }

    #[test]
    fn parse_all_scans_multiple_lines_in_order() {
        let text = "I'll check both.\nUSE_TOOL:ping_host:{\"host\": \"a\"}\nUSE_TOOL:ping_host:{\"host\": \"b\"}\n";
        let calls = parse_all(text);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].arguments["host"], "a");
        assert_eq!(calls[1].arguments["host"], "b");
    }

    #[test]
    fn malformed_lines_are_reported() {
        let text = "USE_TOOL:ping_host:{not json}\nplain text\n";
        let bad = malformed_lines(text);
        assert_eq!(bad, vec!["USE_TOOL:ping_host:{not json}"]);
    }
}
