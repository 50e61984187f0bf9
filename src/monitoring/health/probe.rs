//! HTTP health probe
//!
//! One bounded GET per call. Every failure path resolves to a
//! [`ProbeReport`]; nothing here returns an error to the caller.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};
use url::Url;

use super::credentials::CredentialStore;
use super::mapping::map_raw_status;
use super::payload::{HttpHealthPayload, parse_http_payload};
use super::types::{ServiceHealth, ServiceKind, ServiceStatus};
use crate::config::HttpConfig;
use crate::utils::error::{MonitorError, Result};

/// Why a probe did not yield a usable payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// The deadline fired before a response arrived
    Timeout,
    /// Network unreachable, DNS failure, refused connection, reset
    Connection(String),
    /// Non-2xx response
    Http { status: u16, message: String },
    /// 2xx response whose body is not a health payload
    Malformed(String),
    /// Endpoint or timeout unusable before any request was made
    InvalidRequest(String),
}

impl ProbeFailure {
    /// Timeouts may be transient and only warn; everything else is an error
    pub fn status(&self) -> ServiceStatus {
        match self {
            ProbeFailure::Timeout => ServiceStatus::Warning,
            _ => ServiceStatus::Error,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeFailure::Timeout)
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeFailure::Timeout => {
                write!(f, "Request timeout — backend may be slow or overloaded")
            }
            ProbeFailure::Connection(message) => write!(f, "Connection failed: {}", message),
            ProbeFailure::Http { status, message } => write!(f, "HTTP {}: {}", status, message),
            ProbeFailure::Malformed(message) => {
                write!(f, "Malformed health response: {}", message)
            }
            ProbeFailure::InvalidRequest(message) => {
                write!(f, "Invalid health request: {}", message)
            }
        }
    }
}

/// Result of one probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    /// Health of the API itself
    pub api: ServiceHealth,
    /// Parsed body, present only for a 2xx response with a valid payload
    pub payload: Option<HttpHealthPayload>,
    /// Failure classification when no payload is available
    pub failure: Option<ProbeFailure>,
}

impl ProbeReport {
    pub fn success(api: ServiceHealth, payload: HttpHealthPayload) -> Self {
        Self {
            api,
            payload: Some(payload),
            failure: None,
        }
    }

    pub fn failure(failure: ProbeFailure, response_time_ms: Option<u64>) -> Self {
        let api = ServiceHealth::observed(
            ServiceKind::Api,
            failure.status(),
            Utc::now(),
            response_time_ms,
            Some(failure.to_string()),
        );
        Self {
            api,
            payload: None,
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.payload.is_some()
    }
}

/// Anything that can run a health probe
#[async_trait]
pub trait HealthSource: Send + Sync {
    async fn probe(&self, endpoint: &str, timeout: Duration) -> ProbeReport;
}

/// `reqwest` backed probe against the configured API base
pub struct HealthProbe {
    client: Client,
    base_url: Url,
    credentials: Option<Arc<dyn CredentialStore>>,
}

impl fmt::Debug for HealthProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthProbe")
            .field("base_url", &self.base_url.as_str())
            .field("credentials", &self.credentials.is_some())
            .finish()
    }
}

impl HealthProbe {
    /// Build a probe. Cookies set by the backend are kept and replayed.
    pub fn new(config: &HttpConfig, credentials: Option<Arc<dyn CredentialStore>>) -> Result<Self> {
        let base_url = Url::parse(&config.api_base)
            .map_err(|e| MonitorError::config(format!("Invalid api_base: {}", e)))?;

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    /// Resolve an absolute endpoint as-is, or a relative one under the API base
    pub fn resolve(&self, endpoint: &str) -> std::result::Result<Url, url::ParseError> {
        if let Ok(absolute) = Url::parse(endpoint) {
            return Ok(absolute);
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = endpoint.trim_start_matches('/');
        Url::parse(&format!("{}/{}", base, path))
    }

    async fn fetch(
        &self,
        url: Url,
        timeout: Duration,
    ) -> std::result::Result<(StatusCode, Vec<u8>), ProbeFailure> {
        let mut request = self
            .client
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        if let Some(token) = self.credentials.as_ref().and_then(|c| c.bearer_token()) {
            request = request.bearer_auth(token);
        }

        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body.to_vec()))
        };

        match tokio::time::timeout(timeout, exchange).await {
            Err(_) => Err(ProbeFailure::Timeout),
            Ok(Err(e)) if e.is_timeout() => Err(ProbeFailure::Timeout),
            Ok(Err(e)) => Err(ProbeFailure::Connection(connection_message(&e))),
            Ok(Ok(result)) => Ok(result),
        }
    }
}

#[async_trait]
impl HealthSource for HealthProbe {
    async fn probe(&self, endpoint: &str, timeout: Duration) -> ProbeReport {
        if timeout.is_zero() {
            return ProbeReport::failure(
                ProbeFailure::InvalidRequest("timeout must be greater than zero".to_string()),
                None,
            );
        }

        let url = match self.resolve(endpoint) {
            Ok(url) => url,
            Err(e) => {
                return ProbeReport::failure(
                    ProbeFailure::InvalidRequest(format!("{}: {}", endpoint, e)),
                    None,
                );
            }
        };

        debug!("Probing health endpoint {}", url);
        let started = Instant::now();
        let outcome = self.fetch(url, timeout).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let (status, body) = match outcome {
            Ok(result) => result,
            Err(failure) => {
                warn!("Health probe failed: {}", failure);
                return ProbeReport::failure(failure, Some(elapsed_ms));
            }
        };

        if !status.is_success() {
            let failure = ProbeFailure::Http {
                status: status.as_u16(),
                message: error_message(status, &body),
            };
            warn!("Health probe failed: {}", failure);
            return ProbeReport::failure(failure, Some(elapsed_ms));
        }

        match parse_http_payload(&body) {
            Ok(payload) => {
                // A 2xx without a top-level status still proves the API answers.
                let api_status = match payload.status.as_deref() {
                    Some(raw) => map_raw_status(Some(raw)),
                    None => ServiceStatus::Active,
                };
                let detail = match api_status {
                    ServiceStatus::Active => None,
                    _ => Some(format!(
                        "Backend reports {}",
                        payload.status.as_deref().unwrap_or("unknown")
                    )),
                };
                let api = ServiceHealth::observed(
                    ServiceKind::Api,
                    api_status,
                    Utc::now(),
                    Some(elapsed_ms),
                    detail,
                );
                ProbeReport::success(api, payload)
            }
            Err(e) => {
                let failure = ProbeFailure::Malformed(e.to_string());
                warn!("Health probe failed: {}", failure);
                ProbeReport::failure(failure, Some(elapsed_ms))
            }
        }
    }
}

/// Server-provided message of an error response, or the reason phrase
fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "Unknown error".to_string())
}

fn connection_message(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message = format!("{}: {}", message, cause);
        source = std::error::Error::source(cause);
    }
    message
}
