//! Health snapshot types and data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::mapping::{OverallStatus, rollup};

/// Closed set of statuses a monitored service can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Active,
    Warning,
    Error,
    Loading,
    Inactive,
}

impl ServiceStatus {
    /// Whether an error detail may accompany this status
    #[inline]
    pub fn carries_detail(&self) -> bool {
        matches!(self, ServiceStatus::Warning | ServiceStatus::Error)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceStatus::Active => "active",
            ServiceStatus::Warning => "warning",
            ServiceStatus::Error => "error",
            ServiceStatus::Loading => "loading",
            ServiceStatus::Inactive => "inactive",
        };
        f.write_str(name)
    }
}

/// The five services shown on every status surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Api,
    Database,
    Websocket,
    Auth,
    Realtime,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 5] = [
        ServiceKind::Api,
        ServiceKind::Database,
        ServiceKind::Websocket,
        ServiceKind::Auth,
        ServiceKind::Realtime,
    ];

    /// Snapshot key
    pub fn key(&self) -> &'static str {
        match self {
            ServiceKind::Api => "api",
            ServiceKind::Database => "database",
            ServiceKind::Websocket => "websocket",
            ServiceKind::Auth => "auth",
            ServiceKind::Realtime => "realtime",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            ServiceKind::Api => "API",
            ServiceKind::Database => "Database",
            ServiceKind::Websocket => "WebSocket",
            ServiceKind::Auth => "Auth",
            ServiceKind::Realtime => "Realtime",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Observed health of one service
///
/// Fields are private so the detail invariant holds: `error_detail` is only
/// kept for `warning` and `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceHealth {
    kind: ServiceKind,
    status: ServiceStatus,
    last_checked: Option<DateTime<Utc>>,
    response_time_ms: Option<u64>,
    error_detail: Option<String>,
}

impl ServiceHealth {
    /// Entry as created at mount, before any observation
    pub fn loading(kind: ServiceKind) -> Self {
        Self {
            kind,
            status: ServiceStatus::Loading,
            last_checked: None,
            response_time_ms: None,
            error_detail: None,
        }
    }

    /// Entry for an observation made at `at`
    pub fn observed(
        kind: ServiceKind,
        status: ServiceStatus,
        at: DateTime<Utc>,
        response_time_ms: Option<u64>,
        error_detail: Option<String>,
    ) -> Self {
        Self {
            kind,
            status,
            last_checked: Some(at),
            response_time_ms,
            error_detail: error_detail.filter(|_| status.carries_detail()),
        }
    }

    /// Same observation attributed to another service
    pub fn proxied_as(&self, kind: ServiceKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }

    /// Same observation, re-timestamped
    pub(crate) fn stamped(mut self, at: DateTime<Utc>) -> Self {
        self.last_checked = Some(at);
        self
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.key()
    }

    pub fn status(&self) -> ServiceStatus {
        self.status
    }

    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.last_checked
    }

    pub fn response_time_ms(&self) -> Option<u64> {
        self.response_time_ms
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.status == ServiceStatus::Active
    }
}

/// Which input currently owns the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusSource {
    #[default]
    Polling,
    Socket,
}

/// Point-in-time view over all monitored services
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendStatusSnapshot {
    services: BTreeMap<ServiceKind, ServiceHealth>,
    last_global_check: Option<DateTime<Utc>>,
    is_checking: bool,
    source: StatusSource,
}

impl Default for BackendStatusSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendStatusSnapshot {
    /// Snapshot at mount: every service loading
    pub fn new() -> Self {
        Self {
            services: ServiceKind::ALL
                .iter()
                .map(|kind| (*kind, ServiceHealth::loading(*kind)))
                .collect(),
            last_global_check: None,
            is_checking: false,
            source: StatusSource::Polling,
        }
    }

    pub fn service(&self, kind: ServiceKind) -> &ServiceHealth {
        // Every kind is inserted in `new` and entries are only ever replaced.
        &self.services[&kind]
    }

    /// Services in display order
    pub fn services(&self) -> impl Iterator<Item = &ServiceHealth> {
        self.services.values()
    }

    pub fn last_global_check(&self) -> Option<DateTime<Utc>> {
        self.last_global_check
    }

    pub fn is_checking(&self) -> bool {
        self.is_checking
    }

    pub fn source(&self) -> StatusSource {
        self.source
    }

    /// Rolled up status over all services
    pub fn overall(&self) -> OverallStatus {
        rollup(self.services.values().map(ServiceHealth::status))
    }

    pub fn active_count(&self) -> usize {
        self.services.values().filter(|s| s.is_active()).count()
    }

    pub fn total_count(&self) -> usize {
        self.services.len()
    }

    /// Replace one service entry.
    ///
    /// `last_checked` never moves backwards for a service.
    pub(crate) fn put(&mut self, mut health: ServiceHealth) {
        if let Some(previous) = self.services.get(&health.kind).and_then(|s| s.last_checked) {
            health.last_checked = Some(match health.last_checked {
                Some(at) if at >= previous => at,
                _ => previous,
            });
        }
        self.services.insert(health.kind, health);
    }

    pub(crate) fn set_checking(&mut self, checking: bool) {
        self.is_checking = checking;
    }

    pub(crate) fn set_source(&mut self, source: StatusSource) {
        self.source = source;
    }

    pub(crate) fn mark_checked(&mut self, at: DateTime<Utc>) {
        self.last_global_check = Some(match self.last_global_check {
            Some(previous) if previous > at => previous,
            _ => at,
        });
    }
}
