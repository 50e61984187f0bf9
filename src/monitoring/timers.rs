//! Accounting for armed timers
//!
//! Every sleep the monitor schedules goes through a [`TimerGauge`], so
//! teardown can be checked for leftover timers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Shared counter of currently armed timers
#[derive(Debug, Clone, Default)]
pub struct TimerGauge {
    armed: Arc<AtomicUsize>,
}

/// Held for as long as a timer is armed
#[derive(Debug)]
struct ArmedTimer {
    armed: Arc<AtomicUsize>,
}

impl Drop for ArmedTimer {
    fn drop(&mut self) {
        self.armed.fetch_sub(1, Ordering::AcqRel);
    }
}

impl TimerGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers armed right now
    pub fn armed(&self) -> usize {
        self.armed.load(Ordering::Acquire)
    }

    fn arm(&self) -> ArmedTimer {
        self.armed.fetch_add(1, Ordering::AcqRel);
        ArmedTimer {
            armed: self.armed.clone(),
        }
    }

    /// Sleep while counted as armed; dropping the future disarms it
    pub async fn sleep(&self, duration: Duration) {
        let _armed = self.arm();
        tokio::time::sleep(duration).await;
    }
}
