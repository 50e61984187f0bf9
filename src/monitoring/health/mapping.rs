//! Status mapping and rollup
//!
//! Every raw backend status passes through [`map_raw_status`], and every
//! overall status comes from [`rollup`]. Nothing else assigns statuses from
//! backend strings.

use serde::Serialize;
use std::fmt;

use super::types::ServiceStatus;

/// Map a raw backend status string onto the closed status set.
///
/// `up`/`healthy` are active, `degraded` is a warning, and `down`,
/// `unhealthy`, anything unknown, or an absent value is an error.
pub fn map_raw_status(raw: Option<&str>) -> ServiceStatus {
    let normalized = raw.map(|s| s.trim().to_ascii_lowercase());
    match normalized.as_deref() {
        Some("up") | Some("healthy") => ServiceStatus::Active,
        Some("degraded") => ServiceStatus::Warning,
        Some("down") | Some("unhealthy") => ServiceStatus::Error,
        _ => ServiceStatus::Error,
    }
}

/// Map a status string paired with a boolean health flag.
///
/// The flag fills in when the string is absent. A `false` flag next to a
/// status that maps to active downgrades it to a warning.
pub fn map_signal(raw: Option<&str>, healthy: Option<bool>) -> ServiceStatus {
    match (raw, healthy) {
        (None, Some(true)) => map_raw_status(Some("up")),
        (None, _) => map_raw_status(None),
        (Some(raw), flag) => match map_raw_status(Some(raw)) {
            ServiceStatus::Active if flag == Some(false) => ServiceStatus::Warning,
            status => status,
        },
    }
}

/// Overall status over a set of services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Active,
    Warning,
    Error,
    Loading,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverallStatus::Active => "active",
            OverallStatus::Warning => "warning",
            OverallStatus::Error => "error",
            OverallStatus::Loading => "loading",
        };
        f.write_str(name)
    }
}

/// Worst-case rollup shared by every consumer.
///
/// Any `error` wins, then any `loading`; all `active` is active, and every
/// other mix is a warning.
pub fn rollup<I>(statuses: I) -> OverallStatus
where
    I: IntoIterator<Item = ServiceStatus>,
{
    let mut any_loading = false;
    let mut all_active = true;
    let mut seen = false;

    for status in statuses {
        seen = true;
        match status {
            ServiceStatus::Error => return OverallStatus::Error,
            ServiceStatus::Loading => any_loading = true,
            ServiceStatus::Active => {}
            ServiceStatus::Warning | ServiceStatus::Inactive => all_active = false,
        }
    }

    if !seen || any_loading {
        OverallStatus::Loading
    } else if all_active {
        OverallStatus::Active
    } else {
        OverallStatus::Warning
    }
}

/// Headline text for a rollup
pub fn status_label(overall: OverallStatus, active: usize, total: usize) -> String {
    match overall {
        OverallStatus::Loading => "Checking Systems".to_string(),
        _ if active == total => "All Systems Live".to_string(),
        _ => format!("{}/{} Systems Live", active, total),
    }
}
