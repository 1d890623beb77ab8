//! Interaction log types shared between the router (producer) and the
//! feedback handler (mutator) — spec §3, §4.4.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingType {
    DirectShortcut,
    LlmWithTools,
    LlmOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    None,
    ThumbsUp,
    ThumbsDown,
}

impl Default for Feedback {
    fn default() -> Self {
        Feedback::None
    }
}

/// One full user-turn record. Lives ephemerally under
/// `interaction:{session_id}:{interaction_id}` for 24h; promoted to the
/// durable store on `thumbs_up`, replaced by a `negative_feedback` row on
/// `thumbs_down`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub interaction_id: String,
    pub session_id: String,
    pub user_message: String,
    pub final_response: String,
    pub routing_type: RoutingType,
    pub tools_used: Vec<String>,
    pub tool_results: serde_json::Value,
    pub llm_payload: Option<serde_json::Value>,
    pub llm_response: Option<String>,
    pub debug_info: serde_json::Value,
    #[serde(default)]
    pub feedback: Feedback,
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    /// A fresh, random 128-bit interaction ID rendered compactly.
    /// Design note: the source used a weak non-cryptographic hash; any
    /// unique-per-call identifier suffices, so we use a UUIDv4.
    pub fn new_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    pub fn redis_key(session_id: &str, interaction_id: &str) -> String {
        format!("interaction:{session_id}:{interaction_id}")
    }
}

/// Row written to the durable `negative_feedback` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegativeFeedbackRow {
    pub interaction_id: String,
    pub session_id: String,
    pub user_message: String,
    pub final_response: String,
    pub routing_type: RoutingType,
    pub tools_used: Vec<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}
