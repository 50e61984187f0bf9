//! Adaptive HTTP polling
//!
//! The poller re-arms after every cycle with an interval chosen from the
//! current healthy streak, and stands down while the health channel is
//! connected.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::{PollTier, PollingConfig, default_poll_tiers};
use crate::monitoring::socket::ConnectionState;
use crate::monitoring::timers::TimerGauge;

/// Used only when no tier is configured
const FALLBACK_INTERVAL: Duration = Duration::from_secs(60);

/// Interval schedule keyed by consecutive healthy checks
#[derive(Debug, Clone, PartialEq)]
pub struct PollIntervalPolicy {
    tiers: Vec<PollTier>,
}

impl Default for PollIntervalPolicy {
    fn default() -> Self {
        Self::new(default_poll_tiers())
    }
}

impl PollIntervalPolicy {
    /// Tiers are sorted by streak; an interval lower than an earlier tier's
    /// is raised to it, so a longer streak never polls more often.
    pub fn new(mut tiers: Vec<PollTier>) -> Self {
        tiers.sort_by_key(|t| t.min_streak);
        let mut floor = 0;
        for tier in &mut tiers {
            floor = floor.max(tier.interval_ms);
            tier.interval_ms = floor;
        }
        Self { tiers }
    }

    pub fn interval_for(&self, streak: u32) -> Duration {
        self.tiers
            .iter()
            .rev()
            .find(|t| streak >= t.min_streak)
            .or_else(|| self.tiers.first())
            .map(|t| Duration::from_millis(t.interval_ms))
            .unwrap_or(FALLBACK_INTERVAL)
    }
}

/// Something the poller can drive
#[async_trait]
pub trait PollTarget: Send + Sync + 'static {
    /// Run one cycle and return the healthy streak after it
    async fn poll_once(&self) -> u32;

    /// Polling takes over from the health channel
    fn resume(&self) {}
}

/// Scheduler for HTTP fallback cycles
#[derive(Debug, Clone)]
pub struct AdaptivePoller {
    policy: PollIntervalPolicy,
    initial_delay: Duration,
    timers: TimerGauge,
}

impl AdaptivePoller {
    pub fn new(config: &PollingConfig, timers: TimerGauge) -> Self {
        Self {
            policy: PollIntervalPolicy::new(config.tiers.clone()),
            initial_delay: config.initial_delay(),
            timers,
        }
    }

    /// Start polling `target` until `shutdown` turns true or its sender drops
    pub fn spawn<T: PollTarget>(
        self,
        target: Arc<T>,
        mut connection: watch::Receiver<ConnectionState>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::select! {
                _ = self.timers.sleep(self.initial_delay) => {}
                _ = stopped(&mut shutdown) => return,
            }

            loop {
                let connected = connection.borrow().is_connected();
                if connected {
                    debug!("Health channel connected, HTTP polling suspended");
                    tokio::select! {
                        _ = until_disconnected(&mut connection) => {}
                        _ = stopped(&mut shutdown) => return,
                    }
                    debug!("Health channel lost, HTTP polling resumed");
                    target.resume();
                }

                let streak = target.poll_once().await;
                let interval = self.policy.interval_for(streak);
                debug!(streak, ?interval, "Next health poll scheduled");

                tokio::select! {
                    _ = self.timers.sleep(interval) => {}
                    _ = until_connected(&mut connection) => {}
                    _ = stopped(&mut shutdown) => return,
                }
            }
        })
    }
}

pub(super) async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Never resolves once the state sender is gone
async fn until_connected(connection: &mut watch::Receiver<ConnectionState>) {
    let connected = connection.wait_for(|s| s.is_connected()).await.is_ok();
    if !connected {
        std::future::pending::<()>().await;
    }
}

async fn until_disconnected(connection: &mut watch::Receiver<ConnectionState>) {
    let _ = connection.wait_for(|s| !s.is_connected()).await;
}
