//! Polling, throttling and caching configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One step of the adaptive poll schedule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollTier {
    /// Healthy streak at which this tier starts
    pub min_streak: u32,
    /// Interval used while in this tier
    pub interval_ms: u64,
}

/// HTTP fallback scheduling
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollingConfig {
    /// Delay before the first HTTP cycle after start
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Minimum gap between two probe cycles
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Lifetime of a cached snapshot
    #[serde(default = "default_cache_duration_ms")]
    pub cache_duration_ms: u64,
    /// Interval schedule keyed by consecutive healthy checks
    #[serde(default = "default_poll_tiers")]
    pub tiers: Vec<PollTier>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            cooldown_ms: default_cooldown_ms(),
            cache_duration_ms: default_cache_duration_ms(),
            tiers: default_poll_tiers(),
        }
    }
}

impl PollingConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn cache_duration(&self) -> Duration {
        Duration::from_millis(self.cache_duration_ms)
    }

    /// Merge polling configurations, with other taking precedence
    pub fn merge(mut self, other: Self) -> Self {
        if other.initial_delay_ms != default_initial_delay_ms() {
            self.initial_delay_ms = other.initial_delay_ms;
        }
        if other.cooldown_ms != default_cooldown_ms() {
            self.cooldown_ms = other.cooldown_ms;
        }
        if other.cache_duration_ms != default_cache_duration_ms() {
            self.cache_duration_ms = other.cache_duration_ms;
        }
        if other.tiers != default_poll_tiers() {
            self.tiers = other.tiers;
        }
        self
    }
}
