//! Everything a handler can reach through `State<AppState>`.
//!
//! Cloning is cheap: the pool, the session map and the cart map are all
//! shared behind `Arc`. Session and cart locks are std locks and are never
//! held across an `.await`.

mod cart;

use std::sync::Arc;

use pdv_core::inactivity::InactivityPolicy;
use pdv_core::SecuritySettings;
use pdv_db::Database;

use crate::auth::JwtManager;
use crate::config::ServerConfig;
use crate::session::SessionStore;

pub use cart::CartStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub sessions: SessionStore,
    pub carts: CartStore,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Builds the state with `security` as the starting inactivity policy.
    pub fn new(db: Database, config: ServerConfig, security: SecuritySettings) -> Self {
        AppState {
            db,
            jwt: Arc::new(JwtManager::new(&config.jwt_secret, config.token_lifetime_secs)),
            sessions: SessionStore::new(InactivityPolicy::from(security)),
            carts: CartStore::new(),
            config: Arc::new(config),
        }
    }
}
