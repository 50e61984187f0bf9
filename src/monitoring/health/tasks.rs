//! Background tasks of the health monitor

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use super::aggregator::HealthUpdate;
use super::monitor::MonitorShared;
use super::poller::stopped;
use crate::monitoring::socket::{ConnectionState, Subscription, WebSocketHealthChannel};

/// Mirror channel state into the snapshot and keep one live subscription.
///
/// The channel drops its subscribers whenever it leaves `connected`, so a
/// new subscription is made exactly once after every (re)connect.
pub(super) fn spawn_channel_watcher(
    shared: Arc<MonitorShared>,
    channel: WebSocketHealthChannel,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut states = channel.watch_state();
        let mut subscription: Option<Subscription> = None;
        let mut last_applied: Option<ConnectionState> = None;

        loop {
            let state = *states.borrow_and_update();

            if last_applied != Some(state) {
                let detail = match state {
                    ConnectionState::Reconnecting | ConnectionState::Error => channel.last_error(),
                    _ => None,
                };
                if shared.apply(HealthUpdate::Connection { state, detail }).is_none() {
                    return;
                }
                last_applied = Some(state);
            }

            let live = subscription.as_ref().is_some_and(Subscription::is_live);
            if state.is_connected() && !live {
                let target = Arc::downgrade(&shared);
                subscription = channel.subscribe(move |payload| {
                    if let Some(shared) = target.upgrade() {
                        shared.apply(HealthUpdate::Socket(payload.clone()));
                    }
                });
                if subscription.is_some() {
                    debug!("Subscribed to health pushes");
                }
            }

            tokio::select! {
                changed = states.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = stopped(&mut shutdown) => return,
            }
        }
    })
}
