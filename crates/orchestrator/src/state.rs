use std::sync::Arc;

use tg_domain::config::OrchestratorConfig;
use tg_feedback::FeedbackService;
use tg_llm::LlmClient;
use tg_router::Router;

use crate::toolclient::ToolServerClient;

/// Shared application state passed to all API handlers.
///
/// `feedback` is `None` when `REDIS_HOST` isn't configured — the ephemeral
/// interaction log is disabled and interactions are logged at `debug` level
/// only, per [`OrchestratorConfig::validate`]'s warning.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<OrchestratorConfig>,
    pub router: Arc<Router>,
    pub llm: Arc<LlmClient>,
    pub tool_client: Arc<ToolServerClient>,
    pub feedback: Option<Arc<FeedbackService>>,
}
