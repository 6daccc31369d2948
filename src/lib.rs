pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod interview;

pub use db::DbPool;

use config::Config;
use std::sync::Arc;

use crate::auth::{AuthService, JwtSessionIssuer, LocalIdentityProvider, SystemClock};
use crate::db::{InterviewStore, SqliteStore};

pub struct AppState {
    pub auth: AuthService,
    pub identity: Arc<LocalIdentityProvider>,
    pub interviews: Arc<dyn InterviewStore>,
}

impl AppState {
    pub fn new(
        auth: AuthService,
        identity: Arc<LocalIdentityProvider>,
        interviews: Arc<dyn InterviewStore>,
    ) -> Self {
        Self {
            auth,
            identity,
            interviews,
        }
    }

    /// Wire every store and the identity provider onto one SQLite pool
    pub fn from_pool(config: &Config, pool: DbPool) -> Self {
        let store = Arc::new(SqliteStore::new(pool));
        let issuer = JwtSessionIssuer::new(&config.identity, Arc::new(SystemClock));
        let identity = Arc::new(LocalIdentityProvider::new(store.clone(), issuer));
        let auth = AuthService::new(identity.clone(), store.clone(), config.is_production());
        Self::new(auth, identity, store)
    }
}
