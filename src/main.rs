use std::sync::Arc;

use tracing::{error, info};

use sharedrop::{Config, Database, LocalBlobStore, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let mut config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = sharedrop::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        sharedrop::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    info!("sharedrop {}", env!("CARGO_PKG_VERSION"));

    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database {}: {}", config.database.path, e);
            std::process::exit(1);
        }
    };

    let store = match LocalBlobStore::new(&config.files.storage_path).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(
                "Failed to initialize blob storage at {}: {}",
                config.files.storage_path, e
            );
            std::process::exit(1);
        }
    };
    info!("Blob storage initialized at: {}", config.files.storage_path);

    let server = match WebServer::new(&config, db.clone(), store) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to configure web server: {}", e);
            std::process::exit(1);
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutting down");
    };

    if let Err(e) = server.run(shutdown).await {
        error!("Web server error: {}", e);
    }

    db.close().await;
}
