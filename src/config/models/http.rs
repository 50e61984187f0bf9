//! HTTP health endpoint configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where and how the HTTP health probe reaches the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpConfig {
    /// Base URL that relative endpoints are resolved against
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Health endpoint path, relative to `api_base`
    #[serde(default = "default_health_path")]
    pub health_path: String,
    /// Ask the backend for the detailed payload (`?detailed=true`)
    #[serde(default)]
    pub detailed: bool,
    /// Hard request timeout in milliseconds
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
    /// User agent sent with every probe
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            health_path: default_health_path(),
            detailed: false,
            timeout_ms: default_probe_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Endpoint the poller probes, including the detail flag
    pub fn health_endpoint(&self) -> String {
        if self.detailed {
            format!("{}?detailed=true", self.health_path)
        } else {
            self.health_path.clone()
        }
    }

    /// Merge HTTP configurations, with other taking precedence
    pub fn merge(mut self, other: Self) -> Self {
        if other.api_base != default_api_base() {
            self.api_base = other.api_base;
        }
        if other.health_path != default_health_path() {
            self.health_path = other.health_path;
        }
        if other.detailed {
            self.detailed = true;
        }
        if other.timeout_ms != default_probe_timeout_ms() {
            self.timeout_ms = other.timeout_ms;
        }
        if other.user_agent != default_user_agent() {
            self.user_agent = other.user_agent;
        }
        self
    }
}
