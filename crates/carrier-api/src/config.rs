//! Configuration management for the carrier webhook service.

use std::{net::SocketAddr, str::FromStr};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.toml";

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`config.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// The only setting without a usable default is `webhook_secret`: the
/// service refuses to accept webhooks until it is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Shared secret for webhook signature verification.
    ///
    /// Environment variable: `WEBHOOK_SECRET`
    #[serde(default, alias = "WEBHOOK_SECRET")]
    pub webhook_secret: Option<String>,

    /// SQLite connection URL.
    ///
    /// Environment variable: `DATABASE_URL`
    #[serde(default = "default_database_url", alias = "DATABASE_URL")]
    pub database_url: String,

    /// Maximum number of database connections in the pool.
    ///
    /// Environment variable: `DATABASE_MAX_CONNECTIONS`
    #[serde(default = "default_max_connections", alias = "DATABASE_MAX_CONNECTIONS")]
    pub database_max_connections: u32,

    /// Database connection acquire timeout in seconds.
    ///
    /// Environment variable: `DATABASE_CONNECTION_TIMEOUT`
    #[serde(default = "default_acquire_timeout", alias = "DATABASE_CONNECTION_TIMEOUT")]
    pub database_connection_timeout: u64,

    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,

    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,

    /// HTTP request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    /// Log level configuration.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level", alias = "RUST_LOG")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment
    /// variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error when a source fails to parse or a value fails
    /// validation.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Whether the service is ready to authenticate webhooks.
    ///
    /// True iff the shared secret is present and not blank. Checked once at
    /// startup as a fail-fast precondition and again by the readiness probe.
    pub fn ready(&self) -> bool {
        self.webhook_secret.as_deref().is_some_and(|secret| !secret.trim().is_empty())
    }

    /// Parse server socket address from host and port configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when host and port do not form a valid address.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.database_max_connections == 0 {
            anyhow::bail!("database max_connections must be greater than 0");
        }

        if self.database_connection_timeout == 0 {
            anyhow::bail!("database connection_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_secret: None,
            database_url: default_database_url(),
            database_max_connections: default_max_connections(),
            database_connection_timeout: default_acquire_timeout(),
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            rust_log: default_log_level(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://carrier.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    10
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}
