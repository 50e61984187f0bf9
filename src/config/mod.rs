//! Configuration management for the health monitor
//!
//! This module handles loading, validation, and merging of monitor configuration.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::utils::error::{MonitorError, Result};
use crate::utils::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{debug, info};

/// Main configuration struct for the monitor
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MonitorConfig {
    /// HTTP health probe configuration
    #[serde(default)]
    pub http: HttpConfig,
    /// WebSocket health channel configuration
    #[serde(default)]
    pub socket: SocketConfig,
    /// Poll, throttle and cache configuration
    #[serde(default)]
    pub polling: PollingConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MonitorConfig {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| MonitorError::config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| MonitorError::config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load configuration from `CLINIC_*` environment variables
    ///
    /// A `.env` file in the working directory is read first when present.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(api_base) = env::var("CLINIC_API_BASE") {
            config.http.api_base = api_base;
        }
        if let Ok(path) = env::var("CLINIC_HEALTH_PATH") {
            config.http.health_path = path;
        }
        if let Some(detailed) = env_parse::<bool>("CLINIC_HEALTH_DETAILED")? {
            config.http.detailed = detailed;
        }
        if let Some(timeout) = env_parse::<u64>("CLINIC_HEALTH_TIMEOUT_MS")? {
            config.http.timeout_ms = timeout;
        }
        if let Some(enabled) = env_parse::<bool>("CLINIC_SOCKET_ENABLED")? {
            config.socket.enabled = enabled;
        }
        if let Ok(url) = env::var("CLINIC_SOCKET_URL") {
            config.socket.url = url;
        }
        if let Some(cooldown) = env_parse::<u64>("CLINIC_HEALTH_COOLDOWN_MS")? {
            config.polling.cooldown_ms = cooldown;
        }
        if let Some(cache) = env_parse::<u64>("CLINIC_HEALTH_CACHE_MS")? {
            config.polling.cache_duration_ms = cache;
        }
        if let Ok(level) = env::var("CLINIC_LOG_LEVEL") {
            config.logging.level = level.parse::<LogLevel>()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.http.validate()?;
        self.socket.validate()?;
        self.polling.validate()?;

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(self, other: Self) -> Self {
        Self {
            http: self.http.merge(other.http),
            socket: self.socket.merge(other.socket),
            polling: self.polling.merge(other.polling),
            logging: self.logging.merge(other.logging),
        }
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| MonitorError::config(format!("{} is invalid: {}", key, e))),
        Err(_) => Ok(None),
    }
}
