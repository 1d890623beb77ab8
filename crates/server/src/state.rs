use std::sync::Arc;

use tg_domain::config::ServerConfig;
use tg_ha_sync::HaSynchronizer;
use tg_tools::Dispatcher;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub dispatcher: Arc<Dispatcher>,
    pub ha_sync: Arc<HaSynchronizer>,
}
