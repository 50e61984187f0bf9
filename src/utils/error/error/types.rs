//! Error types for the health monitor

use crate::monitoring::health::PayloadError;
use thiserror::Error;

/// Result type alias for the health monitor
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Main error type for the health monitor
///
/// Probe and channel failures never surface here; they resolve to a
/// `ServiceHealth` value instead. These variants cover construction and
/// internal faults only.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Health payload parsing errors
    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    /// WebSocket transport errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Rejected connection state transition
    #[error("Invalid connection transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}
