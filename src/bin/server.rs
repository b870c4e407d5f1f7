use log::{error, info, warn};
use std::net::SocketAddr;
use warp::Filter;

use sitekeeper::config::ServerConfig;
use sitekeeper::core::state::AppState;
use sitekeeper::handlers;
use sitekeeper::storage::memory::create_memory_storage;

#[tokio::main]
async fn main() {
    // Initialize logging first so config failures are visible
    env_logger::init();

    // Initialize env
    match dotenvy::dotenv() {
        Ok(_) => info!("Environment variables loaded from .env file"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Load config from the environment; a missing or placeholder signing
    // secret is fatal here, never a runtime default
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration: host={}, port={}", config.host, config.port);

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    // The in-memory revocation set empties on restart, which un-revokes
    // any unexpired logged-out tokens. Multi-instance deployments must
    // inject a shared revocation store instead.
    if !config.development_mode {
        warn!("Revocation set is in-memory; a restart forgets pre-expiry logouts");
    }

    let storage = create_memory_storage();
    let state = AppState::new(config, storage);

    let routes = handlers::routes(state).recover(handlers::handle_rejection);

    info!("Starting sitekeeper server on {}", addr);
    warp::serve(routes).run(addr).await;
}
