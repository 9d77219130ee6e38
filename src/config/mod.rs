//! Configuration management
//!
//! This module handles loading and parsing configuration for the Relaypost
//! platform. Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Outbound webhook configuration
    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Externally reachable base URL, used to derive the LinkedIn OAuth
    /// callback address
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            public_url: default_public_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/relaypost.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Outbound webhook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Timeout for generation/approval/publish calls, seconds
    #[serde(default = "default_webhook_timeout")]
    pub timeout_secs: u64,
    /// Timeout for the registration-time reachability probe, seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    /// How often the background session refresher runs, seconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_webhook_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

fn default_webhook_timeout() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_refresh_interval() -> u64 {
    60
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        // An empty file is treated the same as a missing one
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - RELAYPOST_SERVER_HOST
    /// - RELAYPOST_SERVER_PORT
    /// - RELAYPOST_SERVER_CORS_ORIGIN
    /// - RELAYPOST_SERVER_PUBLIC_URL
    /// - RELAYPOST_DATABASE_DRIVER
    /// - RELAYPOST_DATABASE_URL
    /// - RELAYPOST_WEBHOOK_TIMEOUT_SECS
    /// - RELAYPOST_WEBHOOK_REFRESH_INTERVAL_SECS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Server configuration
        if let Ok(host) = std::env::var("RELAYPOST_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("RELAYPOST_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("RELAYPOST_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }
        if let Ok(public_url) = std::env::var("RELAYPOST_SERVER_PUBLIC_URL") {
            self.server.public_url = public_url;
        }

        // Database configuration
        if let Ok(driver) = std::env::var("RELAYPOST_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                other => tracing::warn!("Unknown database driver '{other}', keeping configured value"),
            }
        }
        if let Ok(url) = std::env::var("RELAYPOST_DATABASE_URL") {
            self.database.url = url;
        }

        // Webhook configuration
        if let Ok(timeout) = std::env::var("RELAYPOST_WEBHOOK_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                self.webhook.timeout_secs = timeout;
            }
        }
        if let Ok(interval) = std::env::var("RELAYPOST_WEBHOOK_REFRESH_INTERVAL_SECS") {
            if let Ok(interval) = interval.parse::<u64>() {
                self.webhook.refresh_interval_secs = interval;
            }
        }
    }
}

/// Point the user at the offending line when the YAML fails to parse
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    match e.location() {
        Some(loc) => format!("line {}, column {}: {}", loc.line(), loc.column(), e),
        None => e.to_string(),
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.driver, DatabaseDriver::Sqlite);
        assert_eq!(config.database.url, "data/relaypost.db");
        assert_eq!(config.webhook.timeout_secs, 30);
        assert_eq!(config.webhook.probe_timeout_secs, 5);
        assert_eq!(config.webhook.refresh_interval_secs, 60);
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "   ").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 9090\nwebhook:\n  timeout_secs: 10").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.webhook.timeout_secs, 10);
        assert_eq!(config.webhook.probe_timeout_secs, 5);
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server:
  host: 127.0.0.1
  port: 3001
  cors_origin: https://app.example.com
  public_url: https://api.example.com
database:
  driver: mysql
  url: mysql://root@localhost/relaypost
webhook:
  timeout_secs: 45
  probe_timeout_secs: 3
  refresh_interval_secs: 120
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.server.public_url, "https://api.example.com");
        assert_eq!(config.database.driver, DatabaseDriver::Mysql);
        assert_eq!(config.webhook.timeout_secs, 45);
        assert_eq!(config.webhook.probe_timeout_secs, 3);
        assert_eq!(config.webhook.refresh_interval_secs, 120);
    }

    #[test]
    fn test_load_invalid_yaml_reports_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: [not a number").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_env_overrides() {
        let _guard = lock_env();

        std::env::set_var("RELAYPOST_SERVER_PORT", "4000");
        std::env::set_var("RELAYPOST_DATABASE_DRIVER", "mysql");
        std::env::set_var("RELAYPOST_WEBHOOK_TIMEOUT_SECS", "15");

        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load_with_env(path).unwrap();

        std::env::remove_var("RELAYPOST_SERVER_PORT");
        std::env::remove_var("RELAYPOST_DATABASE_DRIVER");
        std::env::remove_var("RELAYPOST_WEBHOOK_TIMEOUT_SECS");

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.driver, DatabaseDriver::Mysql);
        assert_eq!(config.webhook.timeout_secs, 15);
    }

    #[test]
    fn test_env_override_invalid_port_ignored() {
        let _guard = lock_env();

        std::env::set_var("RELAYPOST_SERVER_PORT", "not-a-port");

        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load_with_env(path).unwrap();

        std::env::remove_var("RELAYPOST_SERVER_PORT");

        assert_eq!(config.server.port, 8080);
    }
}
