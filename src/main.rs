use std::sync::Arc;

use tracing::{error, info};

use itransfer::{Config, Database, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = itransfer::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        itransfer::logging::init_console_only(&config.logging.level);
    }

    info!("iTransfer file transfer service");
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    let db = match Database::connect(&config.database.url, config.database.connect_attempts).await
    {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Could not connect to the database: {}", e);
            std::process::exit(1);
        }
    };

    let server = match WebServer::new(config, db) {
        Ok(server) => server,
        Err(e) => {
            error!("Could not initialize the web server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
