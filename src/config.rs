//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration files (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::time::Duration;

/// Largest page size the remote chat server accepts
pub const MAX_REMOTE_PAGE_SIZE: u32 = 200;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub host: String,
    /// Port number (e.g., 5000)
    pub port: u16,
    /// Allowed CORS origins; empty means permissive
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Remote chat server client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Upper bound for every remote call
    pub timeout_seconds: u64,
    /// User-Agent sent upstream
    pub user_agent: String,
    /// Remote API version segment (e.g., "v4")
    pub api_version: String,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Sync page sizes
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Users fetched per user sync (default: 200)
    pub users_page_size: u32,
    /// Posts fetched per channel sync (default: 60)
    pub posts_page_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (MMRELAY__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.cors_origins", Vec::<String>::new())?
            .set_default("upstream.timeout_seconds", 30)?
            .set_default(
                "upstream.user_agent",
                concat!("mm-relay/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("upstream.api_version", "v4")?
            .set_default("sync.users_page_size", 200)?
            .set_default("sync.posts_page_size", 60)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("MMRELAY")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        use crate::error::AppError;

        if self.upstream.timeout_seconds == 0 {
            return Err(AppError::Config(
                "upstream.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        for (key, value) in [
            ("sync.users_page_size", self.sync.users_page_size),
            ("sync.posts_page_size", self.sync.posts_page_size),
        ] {
            if value == 0 || value > MAX_REMOTE_PAGE_SIZE {
                return Err(AppError::Config(format!(
                    "{key} must be between 1 and {MAX_REMOTE_PAGE_SIZE}"
                )));
            }
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(AppError::Config(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }

        Ok(())
    }
}
