//! The orchestration loop: routes a user turn, dispatches tool calls against
//! the tool-gateway-server, runs the `USE_TOOL` protocol and the synthesis
//! pass, and records the resulting [`Interaction`].

use std::collections::HashSet;

use chrono::Utc;
use serde_json::{json, Map, Value};

use tg_domain::error::Result;
use tg_domain::interaction::{Interaction, RoutingType};
use tg_domain::tool::{ErrorKind, ToolCall, ToolDescriptor, ToolResult};
use tg_router::{protocol, RoutingDecision};

use crate::state::AppState;

pub struct ChatOutcome {
    pub response: String,
    pub tools_used: Vec<String>,
    pub debug: Value,
    pub interaction_id: String,
}

pub async fn handle(state: &AppState, message: &str, session_id: &str) -> Result<ChatOutcome> {
    let decision = state.router.route(message);
    let created_at = Utc::now();
    let interaction_id = Interaction::new_id();

    let turn = match decision {
        RoutingDecision::DirectShortcut {
            tool_name,
            arguments,
        } => direct_shortcut(state, session_id, tool_name, arguments).await?,
        RoutingDecision::LlmWithTools => llm_with_tools(state, message, session_id).await?,
    };

    let interaction = Interaction {
        interaction_id: interaction_id.clone(),
        session_id: session_id.to_string(),
        user_message: message.to_string(),
        final_response: turn.response.clone(),
        routing_type: turn.routing_type,
        tools_used: turn.tools_used.clone(),
        tool_results: turn.tool_results,
        llm_payload: turn.llm_payload,
        llm_response: turn.llm_response,
        debug_info: turn.debug_info.clone(),
        feedback: Default::default(),
        created_at,
    };

    match &state.feedback {
        Some(feedback) => feedback.record(&interaction).await?,
        None => tracing::debug!(
            interaction_id = %interaction_id,
            routing_type = ?interaction.routing_type,
            tools_used = ?interaction.tools_used,
            "interaction log disabled (REDIS_HOST not set) — debug-only record"
        ),
    }

    Ok(ChatOutcome {
        response: turn.response,
        tools_used: turn.tools_used,
        debug: turn.debug_info,
        interaction_id,
    })
}

struct Turn {
    response: String,
    tools_used: Vec<String>,
    tool_results: Value,
    llm_payload: Option<Value>,
    llm_response: Option<String>,
    debug_info: Value,
    routing_type: RoutingType,
}

async fn direct_shortcut(
    state: &AppState,
    session_id: &str,
    tool_name: String,
    arguments: Value,
) -> Result<Turn> {
    let call = ToolCall {
        tool_name: tool_name.clone(),
        arguments: arguments.clone(),
        session_id: session_id.to_string(),
    };
    let result = state.tool_client.call_tool(call).await?;
    let response = render_tool_result(&tool_name, &result);
    let tool_results = json!({ tool_name.clone(): result });
    let debug_info = json!({
        "shortcut_tool": tool_name,
        "shortcut_arguments": arguments,
    });

    Ok(Turn {
        response,
        tools_used: vec![tool_name],
        tool_results,
        llm_payload: None,
        llm_response: None,
        debug_info,
        routing_type: RoutingType::DirectShortcut,
    })
}

async fn llm_with_tools(state: &AppState, message: &str, session_id: &str) -> Result<Turn> {
    let tools = state.tool_client.list_tools().await?;
    let system_prompt = build_system_prompt(&tools);
    let raw = state.llm.chat(&system_prompt, message).await?;

    let calls = protocol::parse_all(&raw);
    let malformed = protocol::malformed_lines(&raw);

    if calls.is_empty() {
        return Ok(Turn {
            response: raw.trim().to_string(),
            tools_used: Vec::new(),
            tool_results: json!({}),
            llm_payload: Some(json!({ "system_prompt": system_prompt })),
            llm_response: Some(raw),
            debug_info: json!({ "malformed_tool_lines": malformed }),
            routing_type: RoutingType::LlmOnly,
        });
    }

    let known: HashSet<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    let mut tools_used = Vec::with_capacity(calls.len());
    let mut results = Map::with_capacity(calls.len());
    let mut transcript = String::new();
    let mut use_tool_lines = Vec::with_capacity(calls.len());

    for call in &calls {
        use_tool_lines.push(protocol::format(&call.tool_name, &call.arguments));

        let result = if known.contains(call.tool_name.as_str()) {
            let tool_call = ToolCall {
                tool_name: call.tool_name.clone(),
                arguments: call.arguments.clone(),
                session_id: session_id.to_string(),
            };
            state.tool_client.call_tool(tool_call).await?
        } else {
            ToolResult::err(
                ErrorKind::UnknownTool,
                format!("model requested unknown tool: {}", call.tool_name),
            )
        };

        transcript.push_str(&format!(
            "{}: {}\n",
            call.tool_name,
            serde_json::to_string(&result)?
        ));
        results.insert(call.tool_name.clone(), serde_json::to_value(&result)?);
        tools_used.push(call.tool_name.clone());
    }

    let synthesis_message = format!(
        "Original request: {message}\n\nTool results:\n{transcript}\nRespond to the user in natural language using these results."
    );
    let synthesis_raw = state.llm.chat(&system_prompt, &synthesis_message).await?;

    Ok(Turn {
        response: synthesis_raw.trim().to_string(),
        tools_used,
        tool_results: Value::Object(results),
        llm_payload: Some(json!({
            "system_prompt": system_prompt,
            "synthesis_message": synthesis_message,
        })),
        llm_response: Some(raw),
        debug_info: json!({
            "malformed_tool_lines": malformed,
            "use_tool_calls": use_tool_lines,
        }),
        routing_type: RoutingType::LlmWithTools,
    })
}

fn build_system_prompt(tools: &[ToolDescriptor]) -> String {
    let mut prompt = String::from(
        "You are a tool-calling assistant. You may answer directly, or request one \
         or more tool calls. To call a tool, emit a line of the exact form \
         USE_TOOL:<name>:<json-args> with no surrounding backticks or prose on that \
         line — one call per line, in the order you want them run. <json-args> must \
         be a single JSON object literal. After tool calls you will be given their \
         results and asked to produce the final reply. Available tools:\n\n",
    );
    for tool in tools {
        prompt.push_str(&format!(
            "- {}: {}\n  parameters: {}\n",
            tool.name, tool.description, tool.parameters
        ));
    }
    prompt
}

fn render_tool_result(tool_name: &str, result: &ToolResult) -> String {
    match result {
        ToolResult::Error { message, .. } => format!("I couldn't do that: {message}"),
        ToolResult::Success { data } => match tool_name {
            "get_network_time" => {
                let timestamp = data.get("timestamp").and_then(Value::as_str).unwrap_or("unknown");
                match data.get("warning").and_then(Value::as_str) {
                    Some(warning) => format!("It's {timestamp} ({warning})."),
                    None => format!("It's {timestamp}."),
                }
            }
            "ping_host" => {
                let host = data.get("host").and_then(Value::as_str).unwrap_or(tool_name);
                let reachable = data.get("reachable").and_then(Value::as_bool).unwrap_or(false);
                if reachable {
                    let latency = data.get("avg_latency_ms").and_then(Value::as_f64);
                    match latency {
                        Some(ms) => format!("{host} is reachable (avg {ms:.1}ms)."),
                        None => format!("{host} is reachable."),
                    }
                } else {
                    format!("{host} is not reachable.")
                }
            }
            _ => data.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_lists_every_tool_with_its_schema() {
        let tools = vec![ToolDescriptor {
            name: "ping_host".to_string(),
            description: "Pings a host".to_string(),
            parameters: json!({"type": "object", "properties": {"host": {"type": "string"}}}),
        }];
        let prompt = build_system_prompt(&tools);
        assert!(prompt.contains("USE_TOOL:<name>:<json-args>"));
        assert!(prompt.contains("ping_host: Pings a host"));
        assert!(prompt.contains("\"host\""));
    }

    #[test]
    fn renders_network_time_success_with_warning() {
        let result = ToolResult::ok(json!({"timestamp": "2026-07-28T12:00:00Z", "warning": "using backup server"}));
        let rendered = render_tool_result("get_network_time", &result);
        assert_eq!(rendered, "It's 2026-07-28T12:00:00Z (using backup server).");
    }

    #[test]
    fn renders_unreachable_ping() {
        let result = ToolResult::ok(json!({"host": "example.com", "reachable": false}));
        let rendered = render_tool_result("ping_host", &result);
        assert_eq!(rendered, "example.com is not reachable.");
    }

    #[test]
    fn renders_tool_error_as_plain_apology() {
        let result = ToolResult::err(ErrorKind::EffectorTimeout, "ping timed out after 5000ms");
        let rendered = render_tool_result("ping_host", &result);
        assert_eq!(rendered, "I couldn't do that: ping timed out after 5000ms");
    }
}
