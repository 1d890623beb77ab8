use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use tg_domain::config::{ConfigSeverity, OrchestratorConfig};
use tg_feedback::{DurableStore, EphemeralStore, FeedbackService};
use tg_llm::LlmClient;
use tg_orchestrator::api;
use tg_orchestrator::cli::{self, Cli, Command, ConfigCommand};
use tg_orchestrator::state::AppState;
use tg_orchestrator::toolclient::ToolServerClient;
use tg_router::Router;

const MAX_CONCURRENT_REQUESTS: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => {
            init_tracing();
            let config = OrchestratorConfig::from_env();
            run_server(Arc::new(config)).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let config = OrchestratorConfig::from_env();
            if !cli::validate(&config) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let config = OrchestratorConfig::from_env();
            cli::show(&config);
            Ok(())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();
}

async fn run_server(config: Arc<OrchestratorConfig>) -> anyhow::Result<()> {
    tracing::info!("tool-gateway-orchestrator starting");

    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    let feedback = build_feedback_service(&config).await;

    let router = Arc::new(Router::default());
    let llm = Arc::new(LlmClient::new(&config.llm).context("building LLM client")?);
    let tool_client =
        Arc::new(ToolServerClient::new(&config.tool_server_url).context("building tool server client")?);

    let app_state = AppState {
        config: config.clone(),
        router,
        llm,
        tool_client,
        feedback,
    };

    let cors_layer = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST]);

    let app = api::router(app_state)
        .layer(cors_layer)
        .layer(tower::limit::ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    tracing::info!(addr = %addr, "tool-gateway-orchestrator listening");

    let serve = axum::serve(listener, app);
    tokio::select! {
        result = serve => result.context("axum server error")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    Ok(())
}

/// Builds the feedback service when both backing stores are reachable.
/// Either missing degrades to `None` — chat still works, interactions are
/// just logged at debug level instead of persisted (spec §7's "recovered
/// locally" policy for a degraded cache backend).
async fn build_feedback_service(config: &OrchestratorConfig) -> Option<Arc<FeedbackService>> {
    let redis_cfg = config.redis.as_ref()?;

    let ephemeral = match EphemeralStore::connect(&redis_cfg.redis_url()).await {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(error = %e, "Redis configured but unreachable — feedback/interaction log disabled");
            return None;
        }
    };

    let durable = match DurableStore::connect(&config.mysql.connection_url()).await {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!(error = %e, "MySQL unreachable — feedback/interaction log disabled");
            return None;
        }
    };

    tracing::info!("feedback store (Redis + MySQL) connected");
    Some(Arc::new(FeedbackService::new(ephemeral, durable)))
}
