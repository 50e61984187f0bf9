//! Snapshot aggregation
//!
//! [`HealthAggregator::aggregate`] is the only place a snapshot changes. It is
//! a pure function of the current snapshot, one update and the time of the
//! update, so every rule here can be tested by comparing snapshots.
//!
//! Source precedence: while the health channel is connected the snapshot's
//! source is [`StatusSource::Socket`] and probe reports only refresh the
//! `api` entry. Otherwise probe reports own every entry they mention.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::mapping::{map_raw_status, map_signal};
use super::payload::{HttpServices, ServiceEntry, SocketHealthPayload, millis};
use super::probe::ProbeReport;
use super::types::{BackendStatusSnapshot, ServiceHealth, ServiceKind, ServiceStatus, StatusSource};
use crate::monitoring::socket::ConnectionState;

/// Detail of a sub-service missing from a `services` object
pub const SERVICE_NOT_FOUND: &str = "Service not found in health response";

/// One input to the snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum HealthUpdate {
    /// A probe cycle finished
    Probe(ProbeReport),
    /// A push arrived on the health channel
    Socket(SocketHealthPayload),
    /// The health channel changed state
    Connection {
        state: ConnectionState,
        detail: Option<String>,
    },
    /// A probe cycle is about to hit the network
    CheckStarted,
    /// A started cycle ended without a report
    CheckAbandoned,
}

/// Stateless reducer over [`BackendStatusSnapshot`]
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthAggregator;

impl HealthAggregator {
    pub fn aggregate(
        current: &BackendStatusSnapshot,
        update: &HealthUpdate,
        now: DateTime<Utc>,
    ) -> BackendStatusSnapshot {
        let mut next = current.clone();

        match update {
            HealthUpdate::Probe(report) => Self::apply_probe(&mut next, report, now),
            HealthUpdate::Socket(payload) => Self::apply_socket(&mut next, payload, now),
            HealthUpdate::Connection { state, detail } => {
                Self::apply_connection(&mut next, *state, detail.as_deref(), now)
            }
            HealthUpdate::CheckStarted => next.set_checking(true),
            HealthUpdate::CheckAbandoned => next.set_checking(false),
        }

        next
    }

    fn apply_probe(snapshot: &mut BackendStatusSnapshot, report: &ProbeReport, now: DateTime<Utc>) {
        snapshot.set_checking(false);
        snapshot.put(report.api.clone().stamped(now));

        if snapshot.source() == StatusSource::Socket {
            debug!("Health channel is authoritative, probe only refreshed the API entry");
            return;
        }

        let Some(payload) = &report.payload else {
            return;
        };
        snapshot.mark_checked(now);

        // Without a services object there is nothing to report per service
        let Some(services) = &payload.services else {
            return;
        };

        let database = entry_health(ServiceKind::Database, services.database.as_ref(), now);
        snapshot.put(database.proxied_as(ServiceKind::Auth));
        snapshot.put(database);
        snapshot.put(entry_health(ServiceKind::Websocket, services.socket.as_ref(), now));
        snapshot.put(http_realtime(services, now));
    }

    fn apply_socket(
        snapshot: &mut BackendStatusSnapshot,
        payload: &SocketHealthPayload,
        now: DateTime<Utc>,
    ) {
        snapshot.set_source(StatusSource::Socket);
        snapshot.mark_checked(now);
        snapshot.put(ServiceHealth::observed(
            ServiceKind::Api,
            ServiceStatus::Active,
            now,
            None,
            None,
        ));

        if let Some(db) = &payload.database {
            let status = map_signal(db.status.as_deref(), db.is_healthy);
            let detail = db
                .error_summary()
                .or_else(|| reported_status(ServiceKind::Database, db.status.as_deref(), status));
            let database = ServiceHealth::observed(
                ServiceKind::Database,
                status,
                now,
                millis(db.avg_response_time),
                detail,
            );
            snapshot.put(database.proxied_as(ServiceKind::Auth));
            snapshot.put(database);
        }

        if let Some(comm) = &payload.communication {
            let socket = comm.socket.as_ref();
            let status = map_signal(comm.status.as_deref(), socket.and_then(|s| s.connected));
            let detail = if comm.issues.is_empty() {
                reported_status(ServiceKind::Websocket, comm.status.as_deref(), status)
            } else {
                Some(comm.issues.join("; "))
            };
            snapshot.put(ServiceHealth::observed(
                ServiceKind::Websocket,
                status,
                now,
                millis(socket.and_then(|s| s.latency)),
                detail,
            ));
        }

        let signals = [
            payload
                .queue
                .as_ref()
                .map(|q| ("queue", map_signal(q.status.as_deref(), q.healthy))),
            payload
                .cache
                .as_ref()
                .map(|c| ("cache", map_signal(c.status.as_deref(), c.healthy))),
            payload
                .communication
                .as_ref()
                .map(|c| ("communication", map_signal(c.status.as_deref(), c.healthy))),
        ];
        let reported: Vec<(&str, ServiceStatus)> = signals.into_iter().flatten().collect();
        if !reported.is_empty() {
            let latency = [
                payload
                    .queue
                    .as_ref()
                    .and_then(|q| q.connection.as_ref())
                    .and_then(|c| c.latency),
                payload.cache.as_ref().and_then(|c| c.latency),
                payload
                    .communication
                    .as_ref()
                    .and_then(|c| c.socket.as_ref())
                    .and_then(|s| s.latency),
            ]
            .into_iter()
            .flatten()
            .fold(None, |max: Option<f64>, v| Some(max.map_or(v, |m| m.max(v))));

            snapshot.put(realtime_health(&reported, millis(latency), now));
        }
    }

    fn apply_connection(
        snapshot: &mut BackendStatusSnapshot,
        state: ConnectionState,
        detail: Option<&str>,
        now: DateTime<Utc>,
    ) {
        let source = if state.is_connected() {
            StatusSource::Socket
        } else {
            StatusSource::Polling
        };
        snapshot.set_source(source);

        let (status, fallback) = match state {
            ConnectionState::Connected => (ServiceStatus::Active, None),
            ConnectionState::Reconnecting => (
                ServiceStatus::Warning,
                Some("Health channel reconnecting"),
            ),
            ConnectionState::Error => (ServiceStatus::Error, Some("Health channel unavailable")),
            ConnectionState::Disconnected => (ServiceStatus::Inactive, None),
            ConnectionState::Connecting => return,
        };

        let detail = detail.or(fallback).map(str::to_string);
        snapshot.put(ServiceHealth::observed(
            ServiceKind::Websocket,
            status,
            now,
            None,
            detail,
        ));
    }
}

/// "{Service} reports {raw}" for a non-active mapped status
fn reported_status(kind: ServiceKind, raw: Option<&str>, status: ServiceStatus) -> Option<String> {
    (status != ServiceStatus::Active)
        .then(|| format!("{} reports {}", kind.label(), raw.unwrap_or("no status")))
}

fn entry_health(
    kind: ServiceKind,
    entry: Option<&ServiceEntry>,
    now: DateTime<Utc>,
) -> ServiceHealth {
    match entry {
        Some(entry) => {
            let status = map_raw_status(entry.status.as_deref());
            let detail = entry
                .reported_error()
                .or_else(|| reported_status(kind, entry.status.as_deref(), status));
            ServiceHealth::observed(kind, status, now, millis(entry.response_time), detail)
        }
        None => ServiceHealth::observed(
            kind,
            ServiceStatus::Error,
            now,
            None,
            Some(SERVICE_NOT_FOUND.to_string()),
        ),
    }
}

fn http_realtime(services: &HttpServices, now: DateTime<Utc>) -> ServiceHealth {
    let parts = [
        ("queue", services.queue.as_ref()),
        ("cache", services.cache.as_ref()),
        ("socket", services.socket.as_ref()),
    ];
    let reported: Vec<(&str, ServiceStatus)> = parts
        .iter()
        .map(|(name, entry)| {
            let status = entry
                .map(|e| map_raw_status(e.status.as_deref()))
                .unwrap_or(ServiceStatus::Error);
            (*name, status)
        })
        .collect();
    realtime_health(&reported, None, now)
}

/// Active only when every reported sub-signal is active
fn realtime_health(
    signals: &[(&str, ServiceStatus)],
    response_time_ms: Option<u64>,
    now: DateTime<Utc>,
) -> ServiceHealth {
    let degraded: Vec<&str> = signals
        .iter()
        .filter(|(_, status)| *status != ServiceStatus::Active)
        .map(|(name, _)| *name)
        .collect();

    if degraded.is_empty() {
        ServiceHealth::observed(
            ServiceKind::Realtime,
            ServiceStatus::Active,
            now,
            response_time_ms,
            None,
        )
    } else {
        ServiceHealth::observed(
            ServiceKind::Realtime,
            ServiceStatus::Warning,
            now,
            response_time_ms,
            Some(format!("Degraded: {}", degraded.join(", "))),
        )
    }
}
