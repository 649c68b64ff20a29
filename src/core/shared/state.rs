use crate::core::config::AppConfig;
use crate::shared::utils::DbPool;
use crate::web::auth::AuthConfig;

pub struct AppState {
    pub conn: DbPool,
    pub config: AppConfig,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(conn: DbPool, config: AppConfig) -> Self {
        let auth = AuthConfig::from_settings(&config.auth);
        Self { conn, config, auth }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("conn", &"DbPool")
            .field("config", &self.config)
            .finish()
    }
}
