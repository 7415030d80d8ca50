use crate::config::AppConfig;
use crate::db::db_pool::DbPool;
use crate::llm::LlmManager;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared application state for the web server. Built once at startup and
/// handed to every handler by reference; no ambient globals.
pub struct AppState {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub llm_manager: Arc<Mutex<LlmManager>>,
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, db_pool: DbPool, llm_manager: LlmManager) -> Self {
        Self {
            config,
            db_pool,
            llm_manager: Arc::new(Mutex::new(llm_manager)),
            startup_time: chrono::Utc::now(),
        }
    }
}
