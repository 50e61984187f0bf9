//! Minimum spacing between probe cycles

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Cooldown gate in front of every probe cycle
#[derive(Debug)]
pub struct RequestThrottle {
    cooldown: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_request: Mutex::new(None),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Admit a request if the cooldown has passed.
    ///
    /// An admitted request records `now` under the same lock as the check.
    pub fn allow(&self) -> bool {
        let now = Instant::now();
        let mut last = self.last_request.lock();

        match *last {
            Some(previous) if now.duration_since(previous) < self.cooldown => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Time until the next request would be admitted
    pub fn remaining(&self) -> Option<Duration> {
        let last = (*self.last_request.lock())?;
        self.cooldown.checked_sub(last.elapsed()).filter(|d| !d.is_zero())
    }
}
