use std::sync::Arc;

use db::DBService;
use services::services::{auth::AuthService, config::Config};

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub config: Arc<Config>,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(db: DBService, config: Config) -> Self {
        let auth = AuthService::new(db.clone(), &config);
        Self {
            db,
            config: Arc::new(config),
            auth,
        }
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.db.pool
    }
}
