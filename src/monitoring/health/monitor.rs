//! Health monitor host
//!
//! [`HealthMonitor`] owns one session's snapshot together with its throttle,
//! cache, poller and health channel. Every mutation goes through
//! [`HealthAggregator`] under a single write lock.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::aggregator::{HealthAggregator, HealthUpdate};
use super::cache::StatusCache;
use super::credentials::CredentialStore;
use super::mapping::OverallStatus;
use super::poller::{AdaptivePoller, PollTarget};
use super::probe::{HealthProbe, HealthSource};
use super::throttle::RequestThrottle;
use super::types::{BackendStatusSnapshot, ServiceHealth};
use crate::config::MonitorConfig;
use crate::monitoring::socket::{
    ConnectionState, SocketTransport, TungsteniteTransport, WebSocketHealthChannel,
};
use crate::monitoring::timers::TimerGauge;
use crate::presentation::{DetailedView, IndicatorView, StatusPresentation};
use crate::utils::error::Result;

/// What started a probe cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTrigger {
    /// Scheduled by the adaptive poller
    Poll,
    /// Requested by a consumer via `refresh`
    Manual,
}

/// Which gate handled a cycle request
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The probe ran and its report was aggregated
    Completed(BackendStatusSnapshot),
    /// A fresh cached snapshot answered the request; nothing changed
    Cached(BackendStatusSnapshot),
    /// Inside the cooldown; nothing changed
    Throttled,
    /// Another cycle is running; the request was dropped
    InFlight,
    /// The monitor has been shut down
    Closed,
}

impl CycleOutcome {
    pub fn reached_network(&self) -> bool {
        matches!(self, CycleOutcome::Completed(_))
    }
}

/// Clears the in-flight flag when the cycle ends, however it ends
struct CycleGuard<'a> {
    in_flight: &'a AtomicBool,
}

impl<'a> CycleGuard<'a> {
    fn acquire(in_flight: &'a AtomicBool) -> Option<Self> {
        in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { in_flight })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}

/// Reports an abandoned check unless the probe report was applied
struct CheckGuard<'a> {
    shared: &'a MonitorShared,
    reported: bool,
}

impl Drop for CheckGuard<'_> {
    fn drop(&mut self) {
        if !self.reported {
            debug!("Health check abandoned before its report");
            self.shared.apply(HealthUpdate::CheckAbandoned);
        }
    }
}

/// State shared between the host, the poller and the channel watcher
pub(super) struct MonitorShared {
    endpoint: String,
    timeout: Duration,
    source: Arc<dyn HealthSource>,
    throttle: RequestThrottle,
    cache: StatusCache,
    snapshot: RwLock<BackendStatusSnapshot>,
    updates: watch::Sender<BackendStatusSnapshot>,
    healthy_streak: AtomicU32,
    in_flight: AtomicBool,
    closed: AtomicBool,
    probe_calls: AtomicUsize,
}

impl MonitorShared {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Aggregate one update; `None` once the monitor is closed
    pub(super) fn apply(&self, update: HealthUpdate) -> Option<BackendStatusSnapshot> {
        if self.is_closed() {
            return None;
        }

        let mut snapshot = self.snapshot.write();
        let next = HealthAggregator::aggregate(&snapshot, &update, Utc::now());
        *snapshot = next.clone();
        self.updates.send_replace(next.clone());
        Some(next)
    }

    /// Clear `checking` even after close so a cancelled cycle cannot freeze it
    fn clear_checking(&self) {
        let mut snapshot = self.snapshot.write();
        if !snapshot.is_checking() {
            return;
        }
        let next =
            HealthAggregator::aggregate(&snapshot, &HealthUpdate::CheckAbandoned, Utc::now());
        *snapshot = next.clone();
        self.updates.send_replace(next);
    }

    async fn run_cycle(&self, trigger: CycleTrigger) -> CycleOutcome {
        if self.is_closed() {
            return CycleOutcome::Closed;
        }

        let Some(_guard) = CycleGuard::acquire(&self.in_flight) else {
            debug!(?trigger, "Health cycle already in flight, dropping request");
            return CycleOutcome::InFlight;
        };

        if !self.throttle.allow() {
            debug!(?trigger, remaining = ?self.throttle.remaining(), "Health check throttled");
            return CycleOutcome::Throttled;
        }

        if let Some(cached) = self.cache.get() {
            debug!(?trigger, age = ?self.cache.age(), "Serving health snapshot from cache");
            return CycleOutcome::Cached(cached);
        }

        if self.apply(HealthUpdate::CheckStarted).is_none() {
            return CycleOutcome::Closed;
        }
        let mut check = CheckGuard {
            shared: self,
            reported: false,
        };
        self.probe_calls.fetch_add(1, Ordering::Relaxed);

        let report = self.source.probe(&self.endpoint, self.timeout).await;
        let succeeded = report.is_success();

        let Some(snapshot) = self.apply(HealthUpdate::Probe(report)) else {
            return CycleOutcome::Closed;
        };
        check.reported = true;

        if succeeded {
            self.cache.set(snapshot.clone());
        }

        let streak = if snapshot.overall() == OverallStatus::Active {
            self.healthy_streak.fetch_add(1, Ordering::AcqRel) + 1
        } else {
            self.healthy_streak.store(0, Ordering::Release);
            0
        };
        debug!(?trigger, streak, overall = %snapshot.overall(), "Health cycle completed");

        CycleOutcome::Completed(snapshot)
    }
}

#[async_trait]
impl PollTarget for MonitorShared {
    async fn poll_once(&self) -> u32 {
        self.run_cycle(CycleTrigger::Poll).await;
        self.healthy_streak.load(Ordering::Acquire)
    }

    fn resume(&self) {
        debug!(age = ?self.cache.age(), "Dropping cached snapshot, polling resumes");
        self.cache.clear();
    }
}

/// Builder for [`HealthMonitor`]
pub struct HealthMonitorBuilder {
    config: MonitorConfig,
    health_source: Option<Arc<dyn HealthSource>>,
    socket_transport: Option<Arc<dyn SocketTransport>>,
    credentials: Option<Arc<dyn CredentialStore>>,
}

impl HealthMonitorBuilder {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            health_source: None,
            socket_transport: None,
            credentials: None,
        }
    }

    /// Replace the HTTP probe
    pub fn health_source(mut self, source: Arc<dyn HealthSource>) -> Self {
        self.health_source = Some(source);
        self
    }

    /// Replace the Socket.IO transport
    pub fn socket_transport(mut self, transport: Arc<dyn SocketTransport>) -> Self {
        self.socket_transport = Some(transport);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Validate the configuration and start the background tasks.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(self) -> Result<HealthMonitor> {
        let config = self.config;
        config.validate()?;

        let source: Arc<dyn HealthSource> = match self.health_source {
            Some(source) => source,
            None => Arc::new(HealthProbe::new(&config.http, self.credentials.clone())?),
        };

        let initial = BackendStatusSnapshot::new();
        let (updates, _) = watch::channel(initial.clone());
        let shared = Arc::new(MonitorShared {
            endpoint: config.http.health_endpoint(),
            timeout: config.http.timeout(),
            source,
            throttle: RequestThrottle::new(config.polling.cooldown()),
            cache: StatusCache::new(config.polling.cache_duration()),
            snapshot: RwLock::new(initial),
            updates,
            healthy_streak: AtomicU32::new(0),
            in_flight: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            probe_calls: AtomicUsize::new(0),
        });

        let timers = TimerGauge::new();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::new();

        let channel = if config.socket.enabled {
            let transport: Arc<dyn SocketTransport> = match self.socket_transport {
                Some(transport) => transport,
                None => Arc::new(TungsteniteTransport::new(&config.socket, self.credentials)),
            };
            let channel = WebSocketHealthChannel::new(transport, &config.socket, timers.clone());
            channel.connect()?;
            tasks.push(super::tasks::spawn_channel_watcher(
                shared.clone(),
                channel.clone(),
                shutdown_rx.clone(),
            ));
            Some(channel)
        } else {
            info!("Health channel disabled, relying on HTTP polling");
            None
        };

        // With the channel disabled the state sender is dropped here, which
        // the poller reads as "never connected".
        let connection = match &channel {
            Some(channel) => channel.watch_state(),
            None => watch::channel(ConnectionState::Disconnected).1,
        };

        let poller = AdaptivePoller::new(&config.polling, timers.clone());
        tasks.push(poller.spawn(shared.clone(), connection, shutdown_rx));

        info!(
            endpoint = %shared.endpoint,
            socket = config.socket.enabled,
            "Health monitor started"
        );

        Ok(HealthMonitor {
            shared,
            channel,
            timers,
            shutdown,
            tasks: Mutex::new(tasks),
        })
    }
}

/// One session's health monitoring
pub struct HealthMonitor {
    shared: Arc<MonitorShared>,
    channel: Option<WebSocketHealthChannel>,
    timers: TimerGauge,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("endpoint", &self.shared.endpoint)
            .field("overall", &self.snapshot().overall())
            .field("connection", &self.connection_state())
            .field("closed", &self.shared.is_closed())
            .finish()
    }
}

impl HealthMonitor {
    pub fn builder(config: MonitorConfig) -> HealthMonitorBuilder {
        HealthMonitorBuilder::new(config)
    }

    /// Start with the default probe and transport
    pub fn start(config: MonitorConfig) -> Result<Self> {
        HealthMonitorBuilder::new(config).start()
    }

    pub fn snapshot(&self) -> BackendStatusSnapshot {
        self.shared.snapshot.read().clone()
    }

    /// Every service entry in display order
    pub fn services(&self) -> Vec<ServiceHealth> {
        self.shared.snapshot.read().services().cloned().collect()
    }

    pub fn is_checking(&self) -> bool {
        self.shared.snapshot.read().is_checking()
    }

    /// Compact indicator for the current snapshot
    pub fn indicator(&self) -> IndicatorView {
        StatusPresentation::indicator(&self.shared.snapshot.read())
    }

    /// Detailed panel for the current snapshot
    pub fn detailed(&self) -> DetailedView {
        StatusPresentation::detailed(&self.shared.snapshot.read())
    }

    /// Receiver that sees every snapshot change
    pub fn subscribe(&self) -> watch::Receiver<BackendStatusSnapshot> {
        self.shared.updates.subscribe()
    }

    /// Run a cycle outside the poll schedule; throttle and cache still apply
    pub async fn refresh(&self) -> CycleOutcome {
        self.shared.run_cycle(CycleTrigger::Manual).await
    }

    pub fn channel(&self) -> Option<&WebSocketHealthChannel> {
        self.channel.as_ref()
    }

    pub fn connection_state(&self) -> Option<ConnectionState> {
        self.channel.as_ref().map(WebSocketHealthChannel::connection_state)
    }

    pub fn healthy_streak(&self) -> u32 {
        self.shared.healthy_streak.load(Ordering::Acquire)
    }

    /// Probes that reached the health source
    pub fn probe_calls(&self) -> usize {
        self.shared.probe_calls.load(Ordering::Relaxed)
    }

    /// Timers armed by the poller and the channel
    pub fn armed_timers(&self) -> usize {
        self.timers.armed()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Stop every task, disarm every timer and freeze the snapshot
    pub async fn shutdown(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("Shutting down health monitor");

        self.shutdown.send_replace(true);

        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task.abort();
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Health monitor task failed: {}", e);
                }
            }
        }

        if let Some(channel) = &self.channel {
            channel.disconnect().await;
        }
        self.shared.clear_checking();

        debug!(armed = self.timers.armed(), "Health monitor stopped");
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        if let Some(channel) = &self.channel {
            channel.abort();
        }
        self.shared.clear_checking();
    }
}
