//! Time-boxed cache of the last probed snapshot

use parking_lot::RwLock;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::types::BackendStatusSnapshot;

#[derive(Debug, Clone)]
struct CacheEntry {
    data: BackendStatusSnapshot,
    stored_at: Instant,
}

/// Single-entry cache with a fixed lifetime.
///
/// Reads never extend the lifetime; expired entries are never returned and
/// are only replaced by the next `set`.
#[derive(Debug)]
pub struct StatusCache {
    ttl: Duration,
    entry: RwLock<Option<CacheEntry>>,
}

impl StatusCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Cached snapshot while it is younger than the lifetime
    pub fn get(&self) -> Option<BackendStatusSnapshot> {
        let entry = self.entry.read();
        let entry = entry.as_ref()?;

        if entry.stored_at.elapsed() < self.ttl {
            Some(entry.data.clone())
        } else {
            None
        }
    }

    /// Overwrite the entry, timestamped now
    pub fn set(&self, snapshot: BackendStatusSnapshot) {
        debug!("Caching health snapshot for {:?}", self.ttl);
        *self.entry.write() = Some(CacheEntry {
            data: snapshot,
            stored_at: Instant::now(),
        });
    }

    pub fn clear(&self) {
        *self.entry.write() = None;
    }

    /// Age of the current entry, fresh or not
    pub fn age(&self) -> Option<Duration> {
        self.entry.read().as_ref().map(|e| e.stored_at.elapsed())
    }
}
