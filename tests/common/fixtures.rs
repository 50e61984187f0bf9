//! Test fixtures and data factories

use clinic_health_monitor::MonitorConfig;
use clinic_health_monitor::config::{HttpConfig, PollTier, PollingConfig, SocketConfig};
use serde_json::{Value, json};

/// Health bodies the backend answers with
pub struct HealthBodies;

impl HealthBodies {
    /// Detailed HTTP payload with every service up
    pub fn all_up() -> Value {
        json!({
            "status": "healthy",
            "version": "2.3.1",
            "environment": "test",
            "services": {
                "database": { "status": "up", "responseTime": 12.4 },
                "socket": { "status": "up" },
                "queue": { "status": "up" },
                "cache": { "status": "up" }
            },
            "systemMetrics": { "uptime": 3600.0 }
        })
    }

    /// HTTP payload with a degraded queue and an unreachable cache
    pub fn degraded_realtime() -> Value {
        json!({
            "status": "degraded",
            "services": {
                "database": { "status": "up" },
                "socket": { "status": "up" },
                "queue": { "status": "degraded" },
                "cache": { "status": "down", "error": "ECONNREFUSED" }
            }
        })
    }

    /// Push payload from the health namespace with every signal healthy
    pub fn socket_push() -> Value {
        json!({
            "database": { "status": "healthy", "isHealthy": true, "avgResponseTime": 8.0 },
            "cache": { "status": "healthy", "healthy": true, "latency": 2.0 },
            "queue": { "status": "healthy", "healthy": true, "connection": { "latency": 5.0 } },
            "communication": {
                "status": "healthy",
                "healthy": true,
                "socket": { "connected": true, "latency": 3.0 },
                "issues": []
            }
        })
    }
}

/// Monitor configurations pointed at local servers
pub struct ConfigFactory;

impl ConfigFactory {
    /// HTTP only, with a poller that stays out of the way of manual refreshes
    pub fn http_only(api_base: &str) -> MonitorConfig {
        MonitorConfig {
            http: HttpConfig {
                api_base: api_base.to_string(),
                detailed: true,
                timeout_ms: 2_000,
                ..HttpConfig::default()
            },
            socket: SocketConfig {
                enabled: false,
                ..SocketConfig::default()
            },
            polling: PollingConfig {
                initial_delay_ms: 3_600_000,
                cooldown_ms: 50,
                cache_duration_ms: 60_000,
                tiers: vec![PollTier {
                    min_streak: 0,
                    interval_ms: 3_600_000,
                }],
            },
            ..MonitorConfig::default()
        }
    }

    /// HTTP plus a push channel at `socket_url`
    pub fn hybrid(api_base: &str, socket_url: &str) -> MonitorConfig {
        let mut config = Self::http_only(api_base);
        config.socket = SocketConfig {
            enabled: true,
            url: socket_url.to_string(),
            reconnect_delay_ms: 100,
            max_reconnect_attempts: 3,
            ..SocketConfig::default()
        };
        config
    }
}
