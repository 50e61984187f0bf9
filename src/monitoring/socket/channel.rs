//! WebSocket health channel
//!
//! Owns the connection state machine and the subscriber list. A background
//! driver task opens connections through a [`SocketTransport`], forwards
//! payloads to subscribers and reconnects after drops.
//!
//! Subscribers are detached whenever the channel leaves `connected`. Callers
//! observe the state and subscribe again after every reconnect. A new
//! subscriber first receives the latest payload of the current connection, so
//! a push that lands between the connect and the subscribe is not lost.

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::state::ConnectionState;
use super::transport::SocketTransport;
use crate::config::SocketConfig;
use crate::monitoring::health::{SocketHealthPayload, parse_socket_payload};
use crate::monitoring::timers::TimerGauge;
use crate::utils::error::{MonitorError, Result};

type HealthCallback = Arc<dyn Fn(&SocketHealthPayload) + Send + Sync>;

struct Subscriber {
    id: u64,
    live: Arc<AtomicBool>,
    callback: HealthCallback,
}

struct ChannelShared {
    state: watch::Sender<ConnectionState>,
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: AtomicU64,
    subscriptions_made: AtomicUsize,
    latest: RwLock<Option<SocketHealthPayload>>,
    delivery: Mutex<()>,
    last_error: RwLock<Option<String>>,
    driver: Mutex<Option<JoinHandle<()>>>,
    transport: Arc<dyn SocketTransport>,
    reconnect_delay: Duration,
    max_reconnect_attempts: u32,
    timers: TimerGauge,
}

impl ChannelShared {
    fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Move to `next` if the current state permits it and `guard` accepts it
    fn transition_if(
        &self,
        next: ConnectionState,
        guard: impl Fn(ConnectionState) -> bool,
    ) -> Result<ConnectionState> {
        let mut previous = None;
        let mut rejected = None;

        self.state.send_if_modified(|current| {
            if guard(*current) && current.can_transition_to(next) {
                previous = Some(*current);
                *current = next;
                true
            } else {
                rejected = Some(*current);
                false
            }
        });

        if let Some(from) = rejected {
            return Err(MonitorError::invalid_transition(from, next));
        }

        let from = previous.unwrap_or(next);
        info!("Health channel {} -> {}", from, next);
        if from.is_connected() {
            *self.latest.write() = None;
            self.detach_all();
        }
        Ok(from)
    }

    fn transition(&self, next: ConnectionState) -> Result<ConnectionState> {
        self.transition_if(next, |_| true)
    }

    fn detach_all(&self) {
        let detached: Vec<Subscriber> = std::mem::take(&mut *self.subscribers.write());
        for subscriber in &detached {
            subscriber.live.store(false, Ordering::Release);
        }
        if !detached.is_empty() {
            debug!("Detached {} health subscribers", detached.len());
        }
    }

    fn deliver(&self, value: Value) {
        let payload = match parse_socket_payload(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Discarding health push: {}", e);
                return;
            }
        };

        let _delivery = self.delivery.lock();
        *self.latest.write() = Some(payload.clone());

        let subscribers: Vec<(Arc<AtomicBool>, HealthCallback)> = self
            .subscribers
            .read()
            .iter()
            .map(|s| (s.live.clone(), s.callback.clone()))
            .collect();

        for (live, callback) in subscribers {
            if live.load(Ordering::Acquire) {
                callback(&payload);
            }
        }
    }

    fn remove(&self, id: u64) {
        self.subscribers.write().retain(|s| s.id != id);
    }
}

/// Handle to the health channel; clones share one connection
#[derive(Clone)]
pub struct WebSocketHealthChannel {
    shared: Arc<ChannelShared>,
}

impl fmt::Debug for WebSocketHealthChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketHealthChannel")
            .field("state", &self.shared.state())
            .field("subscribers", &self.shared.subscribers.read().len())
            .finish()
    }
}

impl WebSocketHealthChannel {
    pub fn new(
        transport: Arc<dyn SocketTransport>,
        config: &SocketConfig,
        timers: TimerGauge,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(ChannelShared {
                state,
                subscribers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                subscriptions_made: AtomicUsize::new(0),
                latest: RwLock::new(None),
                delivery: Mutex::new(()),
                last_error: RwLock::new(None),
                driver: Mutex::new(None),
                transport,
                reconnect_delay: config.reconnect_delay(),
                max_reconnect_attempts: config.max_reconnect_attempts,
                timers,
            }),
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Receiver observing every state change
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Start connecting from `disconnected`
    pub fn connect(&self) -> Result<()> {
        self.shared
            .transition_if(ConnectionState::Connecting, |s| s == ConnectionState::Disconnected)?;
        self.spawn_driver();
        Ok(())
    }

    /// Manual retry after the channel gave up
    pub fn retry(&self) -> Result<()> {
        self.shared
            .transition_if(ConnectionState::Connecting, |s| s == ConnectionState::Error)?;
        self.spawn_driver();
        Ok(())
    }

    /// Stop the driver and detach every subscriber
    pub async fn disconnect(&self) {
        let driver = self.shared.driver.lock().take();
        if let Some(driver) = driver {
            driver.abort();
            let _ = driver.await;
        }

        if self.shared.transition(ConnectionState::Disconnected).is_err() {
            debug!("Health channel already disconnected");
        }
        self.shared.detach_all();
    }

    /// Stop the driver without waiting for it
    pub(crate) fn abort(&self) {
        if let Some(driver) = self.shared.driver.lock().take() {
            driver.abort();
        }
    }

    /// Receive pushes on this connection.
    ///
    /// Returns `None` unless the channel is connected. When this connection
    /// already delivered a payload, `callback` receives it before `subscribe`
    /// returns. The subscription ends when the channel leaves `connected`,
    /// when it is unsubscribed, or when it is dropped.
    ///
    /// `callback` must not subscribe to the same channel.
    pub fn subscribe<F>(&self, callback: F) -> Option<Subscription>
    where
        F: Fn(&SocketHealthPayload) + Send + Sync + 'static,
    {
        let _delivery = self.shared.delivery.lock();
        let callback: HealthCallback = Arc::new(callback);
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let live = Arc::new(AtomicBool::new(true));

        {
            let mut subscribers = self.shared.subscribers.write();
            if !self.shared.state().is_connected() {
                debug!("Ignoring subscribe while {}", self.shared.state());
                return None;
            }
            subscribers.push(Subscriber {
                id,
                live: live.clone(),
                callback: callback.clone(),
            });
        }
        self.shared.subscriptions_made.fetch_add(1, Ordering::Relaxed);

        let replay = self.shared.latest.read().clone();
        if let Some(payload) = replay {
            if live.load(Ordering::Acquire) {
                debug!("Replaying latest health push to new subscriber");
                callback(&payload);
            }
        }

        Some(Subscription {
            id,
            live,
            channel: Arc::downgrade(&self.shared),
        })
    }

    /// Most recent valid payload on the current connection
    pub fn latest(&self) -> Option<SocketHealthPayload> {
        self.shared.latest.read().clone()
    }

    /// Last transport failure
    pub fn last_error(&self) -> Option<String> {
        self.shared.last_error.read().clone()
    }

    /// Successful `subscribe` calls over the channel's lifetime
    pub fn subscriptions_made(&self) -> usize {
        self.shared.subscriptions_made.load(Ordering::Relaxed)
    }

    fn spawn_driver(&self) {
        let handle = tokio::spawn(drive(self.shared.clone()));
        if let Some(previous) = self.shared.driver.lock().replace(handle) {
            previous.abort();
        }
    }
}

/// Disposer for one subscriber
pub struct Subscription {
    id: u64,
    live: Arc<AtomicBool>,
    channel: Weak<ChannelShared>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}

impl Subscription {
    /// Still receiving pushes
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.live.store(false, Ordering::Release);
        if let Some(shared) = self.channel.upgrade() {
            shared.remove(self.id);
        }
    }
}

/// Connection loop; exits once the channel gives up or is moved elsewhere
async fn drive(shared: Arc<ChannelShared>) {
    let mut failures = 0u32;

    loop {
        match shared.transport.connect().await {
            Ok(mut connection) => {
                failures = 0;
                if shared.transition(ConnectionState::Connected).is_err() {
                    return;
                }
                *shared.last_error.write() = None;

                let reason = loop {
                    match connection.next_payload().await {
                        Some(Ok(value)) => shared.deliver(value),
                        Some(Err(e)) => break Some(e.to_string()),
                        None => break None,
                    }
                };

                match &reason {
                    Some(reason) => warn!("Health channel dropped: {}", reason),
                    None => info!("Health channel closed by server"),
                }
                *shared.last_error.write() = reason;

                if shared.transition(ConnectionState::Reconnecting).is_err() {
                    return;
                }
            }
            Err(e) => {
                failures += 1;
                warn!(
                    attempt = failures,
                    max = shared.max_reconnect_attempts,
                    "Health channel connect failed: {}",
                    e
                );
                *shared.last_error.write() = Some(e.to_string());

                if failures >= shared.max_reconnect_attempts {
                    let _ = shared.transition(ConnectionState::Error);
                    return;
                }
            }
        }

        shared.timers.sleep(shared.reconnect_delay).await;
    }
}
