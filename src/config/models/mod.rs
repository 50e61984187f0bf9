//! Configuration data models
//!
//! This module defines all configuration structures used by the monitor.

#![allow(missing_docs)]

pub mod http;
pub mod logging;
pub mod polling;
pub mod socket;

pub use http::*;
pub use logging::*;
pub use polling::*;
pub use socket::*;

pub fn default_true() -> bool {
    true
}

pub fn default_api_base() -> String {
    "http://localhost:8088/api/v1".to_string()
}

pub fn default_health_path() -> String {
    "/health".to_string()
}

/// Default probe timeout in milliseconds
pub fn default_probe_timeout_ms() -> u64 {
    10_000
}

pub fn default_user_agent() -> String {
    concat!("clinic-health-monitor/", env!("CARGO_PKG_VERSION")).to_string()
}

pub fn default_socket_url() -> String {
    "ws://localhost:8088/socket.io/?EIO=4&transport=websocket".to_string()
}

pub fn default_namespace() -> String {
    "/health".to_string()
}

pub fn default_event() -> String {
    "health".to_string()
}

pub fn default_reconnect_delay_ms() -> u64 {
    2_000
}

pub fn default_max_reconnect_attempts() -> u32 {
    5
}

pub fn default_initial_delay_ms() -> u64 {
    2_000
}

pub fn default_cooldown_ms() -> u64 {
    10_000
}

pub fn default_cache_duration_ms() -> u64 {
    60_000
}

pub fn default_poll_tiers() -> Vec<PollTier> {
    vec![
        PollTier {
            min_streak: 0,
            interval_ms: 60_000,
        },
        PollTier {
            min_streak: 2,
            interval_ms: 120_000,
        },
        PollTier {
            min_streak: 5,
            interval_ms: 300_000,
        },
        PollTier {
            min_streak: 10,
            interval_ms: 600_000,
        },
    ]
}
