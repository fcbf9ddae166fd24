use sqlx::PgPool;

use crate::config::AppConfig;
use crate::database::Gateway;
use crate::error::AppError;
use crate::routes::{self, AppAction};
use crate::routing::RouteTable;
use crate::session::SessionStore;
use crate::views::ViewEngine;
use std::time::Duration;

/// Shared application state. Built once at startup and handed to every
/// request as an `Arc`; nothing in here is constructed per request.
pub struct AppState {
    pub config: AppConfig,
    pub gateway: Gateway,
    pub sessions: SessionStore,
    pub views: ViewEngine,
    pub routes: RouteTable<AppAction>,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool) -> Result<Self, AppError> {
        let routes = routes::build(&config)?;
        let views = ViewEngine::new(Some(&config.server.template_dir))?;
        let sessions = SessionStore::new(Duration::from_secs(config.session.ttl_secs));
        Ok(Self {
            gateway: Gateway::new(pool),
            sessions,
            views,
            routes,
            config,
        })
    }
}
