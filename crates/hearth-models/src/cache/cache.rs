//! StatusCache implementation with lazy expiry.

use hearth_abstraction::{Clock, ModelStatus, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info};

use super::types::{CacheEntry, CacheStats};

/// Last known status per model, fresh for a fixed window.
///
/// A stale entry is never returned: reads past expiry drop the entry and
/// report a miss, and writes always restart the window. Locks are only held
/// for the duration of a single synchronous read or write.
#[derive(Debug)]
pub struct StatusCache {
    /// The cache storage (model name -> entry).
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Cache statistics.
    stats: RwLock<CacheStats>,
    /// How long a write stays fresh, in milliseconds.
    window_ms: u64,
    clock: Arc<dyn Clock>,
}

impl StatusCache {
    /// Create a cache on the system clock.
    #[must_use]
    pub fn new(freshness_window: Duration) -> Self {
        Self::with_clock(freshness_window, Arc::new(SystemClock::new()))
    }

    /// Create a cache reading time from `clock`.
    #[must_use]
    pub fn with_clock(freshness_window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stats: RwLock::new(CacheStats::default()),
            window_ms: u64::try_from(freshness_window.as_millis()).unwrap_or(u64::MAX),
            clock,
        }
    }

    /// Get the fresh status for `name`, or `None` if absent or stale.
    pub fn get(&self, name: &str) -> Option<ModelStatus> {
        let now = self.clock.now_ms();

        let found = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            entries.get(name).map(|entry| (entry.is_fresh(now), entry.status.clone()))
        };

        match found {
            Some((true, status)) => {
                self.record(|stats| stats.total_hits += 1);
                debug!(model = %name, "Status cache hit");
                Some(status)
            }
            Some((false, _)) => {
                let expired = {
                    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
                    // A concurrent put may have refreshed the entry since the read.
                    let still_stale = entries.get(name).is_some_and(|entry| !entry.is_fresh(now));
                    if still_stale {
                        entries.remove(name);
                    }
                    still_stale
                };
                self.record(|stats| {
                    stats.total_misses += 1;
                    if expired {
                        stats.total_expired += 1;
                    }
                });
                debug!(model = %name, "Status cache entry expired");
                None
            }
            None => {
                self.record(|stats| stats.total_misses += 1);
                debug!(model = %name, "Status cache miss");
                None
            }
        }
    }

    /// Store `status` for `name`, replacing any previous entry outright.
    pub fn put(&self, name: &str, status: ModelStatus) {
        let entry = CacheEntry::new(status.normalized(), self.clock.now_ms(), self.window_ms);
        let expires_at_ms = entry.expires_at_ms;
        {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            entries.insert(name.to_string(), entry);
        }
        debug!(model = %name, expires_at_ms, "Status cached");
    }

    /// Remove the entry for `name`.
    ///
    /// # Returns
    /// `true` if an entry was removed.
    pub fn remove(&self, name: &str) -> bool {
        let removed = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            entries.remove(name).is_some()
        };
        if removed {
            debug!(model = %name, "Removed status from cache");
        }
        removed
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        let cleared_count = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let count = entries.len();
            entries.clear();
            count
        };
        info!(cleared_count, "Invalidated status cache");
    }

    /// Number of entries currently held, fresh or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The freshness window.
    #[must_use]
    pub const fn freshness_window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Get a snapshot of cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let mut result = self.stats.read().unwrap_or_else(PoisonError::into_inner).clone();
        result.cache_size = self.len();
        result
    }

    fn record(&self, update: impl FnOnce(&mut CacheStats)) {
        let mut stats = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut stats);
    }
}
