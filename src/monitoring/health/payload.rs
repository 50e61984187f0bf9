//! Typed health payloads
//!
//! One parser per payload shape. Callers work with these structures and
//! never read raw JSON paths themselves.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Failures of the payload parsers
#[derive(Error, Debug)]
pub enum PayloadError {
    /// Body is not JSON at all
    #[error("malformed JSON: {0}")]
    Json(#[source] serde_json::Error),

    /// JSON root is not an object
    #[error("expected a JSON object, got {0}")]
    NotAnObject(String),

    /// Object present but a field has the wrong shape
    #[error("unexpected payload shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// Body of `GET {apiBase}/health` (and its `?detailed=true` superset)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HttpHealthPayload {
    pub status: Option<String>,
    pub services: Option<HttpServices>,
    pub version: Option<String>,
    pub environment: Option<String>,
    pub system_metrics: Option<SystemMetrics>,
}

/// Per-dependency section of the HTTP payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HttpServices {
    pub database: Option<ServiceEntry>,
    pub socket: Option<ServiceEntry>,
    pub queue: Option<ServiceEntry>,
    pub cache: Option<ServiceEntry>,
}

/// One dependency in the HTTP payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEntry {
    pub status: Option<String>,
    pub error: Option<String>,
    pub message: Option<String>,
    pub response_time: Option<f64>,
    /// Extra fields carried by the detailed payload
    #[serde(flatten)]
    pub details: serde_json::Map<String, Value>,
}

impl ServiceEntry {
    /// Error text reported by the backend, if any
    pub fn reported_error(&self) -> Option<String> {
        self.error.clone().or_else(|| self.message.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SystemMetrics {
    pub uptime: Option<f64>,
}

/// Push payload on the WebSocket `health` channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SocketHealthPayload {
    pub database: Option<DatabaseSignal>,
    pub cache: Option<CacheSignal>,
    pub queue: Option<QueueSignal>,
    pub communication: Option<CommunicationSignal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSignal {
    pub status: Option<String>,
    pub is_healthy: Option<bool>,
    pub last_health_check: Option<String>,
    pub avg_response_time: Option<f64>,
    /// Either an error count or a list of messages, depending on backend version
    pub errors: Option<Value>,
}

impl DatabaseSignal {
    /// Human readable summary of reported errors
    pub fn error_summary(&self) -> Option<String> {
        match self.errors.as_ref()? {
            Value::Number(n) if n.as_u64().unwrap_or(0) > 0 => {
                Some(format!("{} database errors reported", n))
            }
            Value::Array(items) if !items.is_empty() => Some(
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CacheSignal {
    pub status: Option<String>,
    pub healthy: Option<bool>,
    pub latency: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QueueSignal {
    pub status: Option<String>,
    pub healthy: Option<bool>,
    pub connection: Option<LatencyInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LatencyInfo {
    pub latency: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CommunicationSignal {
    pub status: Option<String>,
    pub healthy: Option<bool>,
    pub socket: Option<SocketInfo>,
    #[serde(default)]
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SocketInfo {
    pub connected: Option<bool>,
    pub latency: Option<f64>,
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn from_object<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, PayloadError> {
    if !value.is_object() {
        return Err(PayloadError::NotAnObject(describe(&value).to_string()));
    }
    serde_json::from_value(value).map_err(PayloadError::Shape)
}

/// Parse an HTTP health response body
pub fn parse_http_payload(body: &[u8]) -> Result<HttpHealthPayload, PayloadError> {
    let value: Value = serde_json::from_slice(body).map_err(PayloadError::Json)?;
    from_object(value)
}

/// Parse a WebSocket health push
pub fn parse_socket_payload(value: Value) -> Result<SocketHealthPayload, PayloadError> {
    from_object(value)
}

/// Round a millisecond measurement reported as a float
pub(crate) fn millis(value: Option<f64>) -> Option<u64> {
    value
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u64)
}
