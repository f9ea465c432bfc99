use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{LoginLimiter, TokenKeys};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub tokens: TokenKeys,
    pub login_limiter: Arc<LoginLimiter>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let tokens = TokenKeys::new(&config.jwt_secret, config.token_ttl);
        Self {
            db,
            config: Arc::new(config),
            tokens,
            login_limiter: Arc::new(LoginLimiter::default()),
        }
    }
}
