//! État partagé entre les requêtes, en lecture seule après le démarrage.

use std::sync::Arc;

use crate::authorization::Enforcer;
use crate::config::Config;
use crate::db::Database;
use crate::utils::token::TokenCodec;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Database,
    pub enforcer: Arc<Enforcer>,
    pub tokens: Arc<TokenCodec>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, db: Database, enforcer: Enforcer) -> Self {
        let tokens = TokenCodec::new(config.secret_key.as_bytes(), config.access_token_ttl);
        Self {
            db,
            enforcer: Arc::new(enforcer),
            tokens: Arc::new(tokens),
            config: Arc::new(config),
        }
    }
}
