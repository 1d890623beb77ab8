use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use tg_domain::config::{ConfigSeverity, ServerConfig};
use tg_ha_sync::cache::StateCache;
use tg_ha_sync::HaSynchronizer;
use tg_server::api;
use tg_server::cli::{self, Cli, Command, ConfigCommand};
use tg_server::state::AppState;
use tg_tools::build_default_dispatcher;

const MAX_CONCURRENT_REQUESTS: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => {
            init_tracing();
            let config = ServerConfig::from_env();
            run_server(Arc::new(config)).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let config = ServerConfig::from_env();
            if !cli::validate(&config) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let config = ServerConfig::from_env();
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

async fn run_server(config: Arc<ServerConfig>) -> anyhow::Result<()> {
    tracing::info!("tool-gateway-server starting");

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

    let redis_conn = match &config.redis {
        Some(redis_cfg) => {
            match StateCache::connect_redis(&redis_cfg.redis_url()).await {
                Ok(conn) => {
                    tracing::info!(host = %redis_cfg.host, "connected to Redis state cache backend");
                    Some(conn)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Redis configured but unreachable — falling back to in-memory cache");
                    None
                }
            }
        }
        None => {
            tracing::info!("REDIS_HOST not set — running with in-memory-only state cache");
            None
        }
    };

    let ha_sync = Arc::new(HaSynchronizer::new(&config.ha, redis_conn));
    if ha_sync.is_configured() {
        match ha_sync.bootstrap().await {
            Ok(count) => tracing::info!(count, "Home Assistant state cache bootstrapped"),
            Err(e) => tracing::warn!(error = %e, "Home Assistant bootstrap fetch failed"),
        }
    } else {
        tracing::warn!("HA_URL/HA_TOKEN not configured — ha_* tools will report effector_unavailable");
    }

    let shutdown = CancellationToken::new();
    let ws_handle = ha_sync.spawn_subscriber(shutdown.clone());
    if ws_handle.is_some() {
        tracing::info!("Home Assistant websocket subscriber spawned");
    }

    let dispatcher = Arc::new(build_default_dispatcher(&config.ntp, ha_sync.clone()));

    let app_state = AppState {
        config: config.clone(),
        dispatcher,
        ha_sync: ha_sync.clone(),
    };

    // Periodic sweep of expired cache entries — mirrors the teacher's
    // periodic-pruning background tasks (stale nodes, terminal runs, etc).
    {
        let cache = ha_sync.cache();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(30));
            loop {
                interval.tick().await;
                let now = chrono::Utc::now();
                let stale = cache.stale_entries(now);
                if !stale.is_empty() {
                    tracing::debug!(count = stale.len(), "HA cache entries past TTL (lazy eviction on next read)");
                }
            }
        });
    }

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
    tracing::info!(addr = %addr, "tool-gateway-server listening");

    let serve = axum::serve(listener, app);
    tokio::select! {
        result = serve => result.context("axum server error")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    shutdown.cancel();
    if let Some(handle) = ws_handle {
        let _ = handle.await;
    }

    Ok(())
}
