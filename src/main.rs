use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use tariff_ask::config::{AppConfig, CliArgs};
use tariff_ask::db::db_pool::build_pool;
use tariff_ask::llm::LlmManager;
use tariff_ask::util::logging::init_tracing;
use tariff_ask::web;
use tariff_ask::web::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_tracing();

    // Pick up a local .env before reading configuration
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let args = CliArgs::parse();

    // Load configuration
    let config = match AppConfig::new(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!(
        "Initializing DuckDB connection pool on {}",
        config.database.connection_string
    );
    let pool = build_pool(&config.database)?;

    // Initialize LLM manager
    info!("Initializing LLM manager with backend: {}", config.llm.backend);
    let llm_manager = LlmManager::new(&config.llm)?;

    // Create application state
    let app_state = Arc::new(AppState::new(config.clone(), pool, llm_manager));

    // Start the web server
    info!(
        "Starting tariff-ask server on {}:{}",
        config.web.host, config.web.port
    );
    match web::run_server(config.web, app_state).await {
        Ok(_) => info!("Server stopped gracefully"),
        Err(e) => {
            error!("Server error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
