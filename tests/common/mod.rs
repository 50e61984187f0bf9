//! Common test utilities for clinic-health-monitor
//!
//! - Health payload fixtures and config factories
//! - A local Socket.IO server speaking just enough of the protocol
//! - Snapshot assertions and wait helpers

pub mod fixtures;
pub mod socket_server;

pub use fixtures::{ConfigFactory, HealthBodies};
pub use socket_server::SocketServer;

use clinic_health_monitor::BackendStatusSnapshot;
use std::time::Duration;
use tokio::sync::watch;

/// Wait until the snapshot satisfies `predicate`, or panic after `within`
pub async fn wait_for<F>(
    updates: &mut watch::Receiver<BackendStatusSnapshot>,
    within: Duration,
    predicate: F,
) -> BackendStatusSnapshot
where
    F: Fn(&BackendStatusSnapshot) -> bool,
{
    let waited = tokio::time::timeout(within, async {
        loop {
            let current = updates.borrow_and_update().clone();
            if predicate(&current) {
                return current;
            }
            if updates.changed().await.is_err() {
                panic!("monitor dropped its update channel");
            }
        }
    })
    .await;

    match waited {
        Ok(snapshot) => snapshot,
        Err(_) => panic!(
            "snapshot did not reach the expected state within {:?}: {:?}",
            within,
            updates.borrow().clone()
        ),
    }
}
