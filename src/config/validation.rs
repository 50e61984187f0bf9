//! Configuration validation
//!
//! This module provides validation logic for all configuration structures.

use super::models::*;
use crate::utils::error::{MonitorError, Result};
use tracing::debug;
use url::Url;

/// Validation trait for configuration structures
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Parse `url_str` and require one of `schemes`
fn validate_url(url_str: &str, context: &str, schemes: &[&str]) -> Result<Url> {
    let url = Url::parse(url_str)
        .map_err(|e| MonitorError::config(format!("{} has invalid URL format: {}", context, e)))?;

    if !schemes.contains(&url.scheme()) {
        return Err(MonitorError::config(format!(
            "{} must use one of {:?}, got: {}",
            context,
            schemes,
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(MonitorError::config(format!(
            "{} URL must have a valid host",
            context
        )));
    }

    Ok(url)
}

impl Validate for HttpConfig {
    fn validate(&self) -> Result<()> {
        validate_url(&self.api_base, "http.api_base", &["http", "https"])?;

        if self.timeout_ms == 0 {
            return Err(MonitorError::config("http.timeout_ms must be greater than 0"));
        }
        if self.health_path.trim().is_empty() {
            return Err(MonitorError::config("http.health_path cannot be empty"));
        }
        Ok(())
    }
}

impl Validate for SocketConfig {
    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        validate_url(&self.url, "socket.url", &["ws", "wss"])?;

        if !self.namespace.starts_with('/') {
            return Err(MonitorError::config(format!(
                "socket.namespace must start with '/', got: {}",
                self.namespace
            )));
        }
        if self.event.is_empty() {
            return Err(MonitorError::config("socket.event cannot be empty"));
        }
        Ok(())
    }
}

impl Validate for PollingConfig {
    fn validate(&self) -> Result<()> {
        if self.cooldown_ms == 0 {
            return Err(MonitorError::config("polling.cooldown_ms must be greater than 0"));
        }

        let first = self
            .tiers
            .first()
            .ok_or_else(|| MonitorError::config("polling.tiers cannot be empty"))?;
        if first.min_streak != 0 {
            return Err(MonitorError::config(
                "polling.tiers must start at min_streak 0",
            ));
        }

        for pair in self.tiers.windows(2) {
            let (lower, upper) = (pair[0], pair[1]);
            if upper.min_streak <= lower.min_streak {
                return Err(MonitorError::config(format!(
                    "polling.tiers min_streak must be strictly increasing ({} then {})",
                    lower.min_streak, upper.min_streak
                )));
            }
            if upper.interval_ms < lower.interval_ms {
                return Err(MonitorError::config(format!(
                    "polling.tiers interval must not shrink as the streak grows ({}ms then {}ms)",
                    lower.interval_ms, upper.interval_ms
                )));
            }
        }

        if self.tiers.iter().any(|tier| tier.interval_ms == 0) {
            return Err(MonitorError::config("polling.tiers interval_ms must be greater than 0"));
        }

        debug!("Polling configuration validated");
        Ok(())
    }
}
