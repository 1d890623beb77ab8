pub mod durable;
pub mod ephemeral;
pub mod service;

pub use durable::DurableStore;
pub use ephemeral::EphemeralStore;
pub use service::FeedbackService;

#[cfg(test)]
mod tests {
    use tg_domain::interaction::{Interaction, RoutingType};

    fn sample_interaction(id: &str) -> Interaction {
        Interaction {
            interaction_id: id.to_string(),
            session_id: "session-1".to_string(),
            user_message: "what time is it".to_string(),
            final_response: "it's 3pm".to_string(),
            routing_type: RoutingType::DirectShortcut,
            tools_used: vec!["get_network_time".to_string()],
            tool_results: serde_json::json!({}),
            llm_payload: None,
            llm_response: None,
            debug_info: serde_json::json!({}),
            feedback: Default::default(),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn redis_key_is_namespaced_by_session_and_interaction() {
        let interaction = sample_interaction("abc123");
        let key = Interaction::redis_key(&interaction.session_id, &interaction.interaction_id);
        assert_eq!(key, "interaction:session-1:abc123");
    }
}
