//! Read-only views over a health snapshot

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::monitoring::health::{
    BackendStatusSnapshot, OverallStatus, ServiceHealth, ServiceStatus, StatusSource, status_label,
};

/// Color family a status renders in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTone {
    Success,
    Warning,
    Danger,
    Pending,
    Muted,
}

impl From<ServiceStatus> for StatusTone {
    fn from(status: ServiceStatus) -> Self {
        match status {
            ServiceStatus::Active => StatusTone::Success,
            ServiceStatus::Warning => StatusTone::Warning,
            ServiceStatus::Error => StatusTone::Danger,
            ServiceStatus::Loading => StatusTone::Pending,
            ServiceStatus::Inactive => StatusTone::Muted,
        }
    }
}

impl From<OverallStatus> for StatusTone {
    fn from(status: OverallStatus) -> Self {
        match status {
            OverallStatus::Active => StatusTone::Success,
            OverallStatus::Warning => StatusTone::Warning,
            OverallStatus::Error => StatusTone::Danger,
            OverallStatus::Loading => StatusTone::Pending,
        }
    }
}

/// Compact indicator: one dot and one label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorView {
    pub overall: OverallStatus,
    pub tone: StatusTone,
    pub label: String,
    pub is_checking: bool,
}

/// One line of the detailed panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceRow {
    pub key: &'static str,
    pub label: &'static str,
    pub status: ServiceStatus,
    pub tone: StatusTone,
    pub response_time: Option<String>,
    pub detail: Option<String>,
    pub last_checked: Option<DateTime<Utc>>,
}

impl From<&ServiceHealth> for ServiceRow {
    fn from(health: &ServiceHealth) -> Self {
        Self {
            key: health.name(),
            label: health.kind().label(),
            status: health.status(),
            tone: health.status().into(),
            response_time: format_response_time(health.response_time_ms()),
            detail: health.error_detail().map(str::to_string),
            last_checked: health.last_checked(),
        }
    }
}

/// Detailed panel: the indicator plus every service, always all five
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedView {
    pub indicator: IndicatorView,
    pub rows: Vec<ServiceRow>,
    pub last_global_check: Option<DateTime<Utc>>,
    pub source: StatusSource,
}

/// Builds views from a snapshot; never probes
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusPresentation;

impl StatusPresentation {
    pub fn indicator(snapshot: &BackendStatusSnapshot) -> IndicatorView {
        let overall = snapshot.overall();
        IndicatorView {
            overall,
            tone: overall.into(),
            label: status_label(overall, snapshot.active_count(), snapshot.total_count()),
            is_checking: snapshot.is_checking(),
        }
    }

    pub fn detailed(snapshot: &BackendStatusSnapshot) -> DetailedView {
        DetailedView {
            indicator: Self::indicator(snapshot),
            rows: snapshot.services().map(ServiceRow::from).collect(),
            last_global_check: snapshot.last_global_check(),
            source: snapshot.source(),
        }
    }
}

/// `42ms` below a second, `1.5s` above
pub fn format_response_time(ms: Option<u64>) -> Option<String> {
    ms.map(|ms| {
        if ms < 1_000 {
            format!("{}ms", ms)
        } else {
            format!("{:.1}s", ms as f64 / 1_000.0)
        }
    })
}
