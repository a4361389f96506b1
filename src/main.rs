use std::process::ExitCode;

use tracing::{error, info};

use feedling::{Config, Database, WebServer};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration
    let mut config = match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = feedling::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        feedling::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    info!("feedling {}", env!("CARGO_PKG_VERSION"));

    let db = match Database::open(&config.database.url, config.database.max_connections).await {
        Ok(db) => db,
        Err(e) => {
            error!(url = %config.database.url, "Failed to open database: {e}");
            return ExitCode::FAILURE;
        }
    };

    let server = match WebServer::new(&config, db) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start web server: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!("Server configured on {}", server.addr());
    if let Err(e) = server.run().await {
        error!("Web server stopped: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
