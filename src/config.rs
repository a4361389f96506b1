//! Configuration module for feedling.

use serde::Deserialize;
use std::path::Path;

use crate::{FeedlingError, Result};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL.
    #[serde(default = "default_db_url")]
    pub url: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_url() -> String {
    "sqlite://data/feedling.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Session token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign session tokens (must be set).
    #[serde(default)]
    pub jwt_secret: String,
    /// Session token lifetime in seconds.
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,
}

fn default_token_expiry() -> u64 {
    7 * 24 * 60 * 60 // 7 days
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_expiry_secs: default_token_expiry(),
        }
    }
}

/// Outbound fetch configuration for pages and feeds.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Read timeout in seconds.
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum number of redirects.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Maximum HTML page size in bytes.
    #[serde(default = "default_max_page_size")]
    pub max_page_size_bytes: u64,
    /// Maximum feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// Maximum items returned per feed.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// Maximum number of HTML nodes visited while looking for feed links.
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    /// Allow fetching from loopback and private networks.
    #[serde(default)]
    pub allow_private_hosts: bool,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    10
}

fn default_total_timeout() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_page_size() -> u64 {
    2 * 1024 * 1024 // 2MB
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_max_items() -> usize {
    100
}

fn default_max_nodes() -> usize {
    100_000
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_redirects: default_max_redirects(),
            max_page_size_bytes: default_max_page_size(),
            max_feed_size_bytes: default_max_feed_size(),
            max_items: default_max_items(),
            max_nodes: default_max_nodes(),
            allow_private_hosts: false,
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Console only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session token settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Outbound fetch settings.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Web API settings.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FeedlingError::Config(e.to_string()))
    }

    /// Apply overrides from environment variables.
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(secret) = get("FEEDLING_JWT_SECRET").or_else(|| get("JWT_SECRET")) {
            self.auth.jwt_secret = secret;
        }
        if let Some(url) = get("FEEDLING_DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(port) = get("FEEDLING_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(level) = get("FEEDLING_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(FeedlingError::Config(
                "auth.jwt_secret must be set (or FEEDLING_JWT_SECRET)".to_string(),
            ));
        }
        if self.auth.token_expiry_secs == 0 {
            return Err(FeedlingError::Config(
                "auth.token_expiry_secs must be greater than zero".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(FeedlingError::Config("server.port must be set".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url, "sqlite://data/feedling.db");
        assert_eq!(config.database.max_connections, 5);
        assert!(config.auth.jwt_secret.is_empty());
        assert_eq!(config.auth.token_expiry_secs, 604_800);
        assert_eq!(config.fetch.total_timeout_secs, 10);
        assert_eq!(config.fetch.max_nodes, 100_000);
        assert!(!config.fetch.allow_private_hosts);
        assert!(config.web.cors_origins.is_empty());
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
url = "sqlite://test.db"
max_connections = 2

[auth]
jwt_secret = "s3cret"
token_expiry_secs = 86400

[fetch]
total_timeout_secs = 5
max_nodes = 500
allow_private_hosts = true

[web]
cors_origins = ["http://localhost:3000"]

[logging]
level = "debug"
file = "logs/feedling.log"
"#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.url, "sqlite://test.db");
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.auth.token_expiry_secs, 86400);
        assert_eq!(config.fetch.total_timeout_secs, 5);
        assert_eq!(config.fetch.connect_timeout_secs, 10);
        assert_eq!(config.fetch.max_nodes, 500);
        assert!(config.fetch.allow_private_hosts);
        assert_eq!(config.web.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file.as_deref(), Some("logs/feedling.log"));
    }

    #[test]
    fn test_parse_partial_config() {
        let config = Config::parse("[server]\nport = 3000\n").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.token_expiry_secs, 604_800);
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("[server\nport = ");
        assert!(matches!(result, Err(FeedlingError::Config(_))));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("/nonexistent/feedling.toml");
        assert!(matches!(result, Err(FeedlingError::Io(_))));
    }

    #[test]
    fn test_overrides_prefer_feedling_secret() {
        let env: HashMap<&str, &str> = [
            ("FEEDLING_JWT_SECRET", "primary"),
            ("JWT_SECRET", "legacy"),
            ("FEEDLING_DATABASE_URL", "sqlite::memory:"),
            ("FEEDLING_PORT", "9999"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.auth.jwt_secret, "primary");
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.server.port, 9999);
    }

    #[test]
    fn test_overrides_fall_back_to_legacy_secret() {
        let mut config = Config::default();
        config.apply_overrides(|k| (k == "JWT_SECRET").then(|| "legacy".to_string()));
        assert_eq!(config.auth.jwt_secret, "legacy");
    }

    #[test]
    fn test_overrides_ignore_empty_and_garbage() {
        let mut config = Config::default();
        config.auth.jwt_secret = "keep".to_string();
        config.apply_overrides(|k| match k {
            "FEEDLING_JWT_SECRET" => Some(String::new()),
            "FEEDLING_PORT" => Some("not-a-port".to_string()),
            _ => None,
        });
        assert_eq!(config.auth.jwt_secret, "keep");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_validate_requires_secret() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("jwt_secret"));
    }

    #[test]
    fn test_validate_with_secret() {
        let mut config = Config::default();
        config.auth.jwt_secret = "secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_expiry() {
        let mut config = Config::default();
        config.auth.jwt_secret = "secret".to_string();
        config.auth.token_expiry_secs = 0;
        assert!(config.validate().is_err());
    }
}
