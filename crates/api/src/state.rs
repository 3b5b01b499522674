use std::sync::Arc;

use crate::config::ServerConfig;
use crate::material_checker::MaterialChecker;
use crate::ws::WsManager;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    pub pool: sitedesk_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Registry of live notification sockets.
    pub ws_manager: Arc<WsManager>,
}

impl AppState {
    pub fn new(pool: sitedesk_db::DbPool, config: ServerConfig, ws_manager: Arc<WsManager>) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            ws_manager,
        }
    }

    /// Material checker wired to this state's pool and socket registry.
    pub fn material_checker(&self) -> MaterialChecker {
        MaterialChecker::new(self.pool.clone(), Arc::clone(&self.ws_manager))
    }
}
