//! WebSocket health channel configuration

use super::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Socket.IO health channel settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocketConfig {
    /// Connect the push channel at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Socket.IO endpoint (ws:// or wss://)
    #[serde(default = "default_socket_url")]
    pub url: String,
    /// Namespace carrying health pushes
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Event name of a health push
    #[serde(default = "default_event")]
    pub event: String,
    /// Wait between reconnect attempts
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Consecutive failed attempts before the channel gives up and reports an error
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_socket_url(),
            namespace: default_namespace(),
            event: default_event(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
        }
    }
}

impl SocketConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Merge socket configurations, with other taking precedence
    pub fn merge(mut self, other: Self) -> Self {
        if !other.enabled {
            self.enabled = false;
        }
        if other.url != default_socket_url() {
            self.url = other.url;
        }
        if other.namespace != default_namespace() {
            self.namespace = other.namespace;
        }
        if other.event != default_event() {
            self.event = other.event;
        }
        if other.reconnect_delay_ms != default_reconnect_delay_ms() {
            self.reconnect_delay_ms = other.reconnect_delay_ms;
        }
        if other.max_reconnect_attempts != default_max_reconnect_attempts() {
            self.max_reconnect_attempts = other.max_reconnect_attempts;
        }
        self
    }
}
