//! Web server for feedling.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::auth::{RequestGate, TokenCodec};
use crate::config::Config;
use crate::feed::FeedFetcher;
use crate::{Database, FeedlingError, Result};

use super::handlers::AppState;
use super::router::create_app;

/// Web server for the API.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a web server from configuration and an open database.
    pub fn new(config: &Config, db: Database) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| FeedlingError::Config(format!("invalid server address: {}", e)))?;

        let codec = TokenCodec::new(&config.auth.jwt_secret, config.auth.token_expiry_secs)?;
        let fetcher = FeedFetcher::new(&config.fetch)?;
        let app_state = AppState::new(db, fetcher, Arc::new(RequestGate::new(codec)))
            .with_max_nodes(config.fetch.max_nodes);

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            cors_origins: config.web.cors_origins.clone(),
        })
    }

    /// Get the configured server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> Result<()> {
        let router = create_app(self.app_state, &self.cors_origins);

        let listener = TcpListener::bind(self.addr).await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Run the server in the background and return the bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let router = create_app(self.app_state, &self.cors_origins);

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
