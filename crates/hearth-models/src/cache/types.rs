//! Core data types for status caching.

use hearth_abstraction::ModelStatus;
use serde::Serialize;

/// A cached status with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The cached status.
    pub status: ModelStatus,
    /// Clock reading (ms) after which the entry is stale.
    pub expires_at_ms: u64,
}

impl CacheEntry {
    /// Create an entry that stays fresh for `window_ms` from `now_ms`.
    pub fn new(status: ModelStatus, now_ms: u64, window_ms: u64) -> Self {
        Self { status, expires_at_ms: now_ms.saturating_add(window_ms) }
    }

    /// An entry read at `now_ms` is fresh up to and including its expiry.
    #[must_use]
    pub const fn is_fresh(&self, now_ms: u64) -> bool {
        now_ms <= self.expires_at_ms
    }
}

/// Cache statistics for observability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads served from a fresh entry.
    pub total_hits: u64,
    /// Reads that found no entry or a stale one.
    pub total_misses: u64,
    /// Stale entries dropped on read.
    pub total_expired: u64,
    /// Current number of entries.
    pub cache_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_fresh_through_expiry() {
        let entry = CacheEntry::new(ModelStatus::default(), 1_000, 30_000);
        assert_eq!(entry.expires_at_ms, 31_000);
        assert!(entry.is_fresh(1_000));
        assert!(entry.is_fresh(31_000));
        assert!(!entry.is_fresh(31_001));
    }

    #[test]
    fn test_entry_expiry_saturates() {
        let entry = CacheEntry::new(ModelStatus::default(), u64::MAX - 1, 30_000);
        assert_eq!(entry.expires_at_ms, u64::MAX);
    }

    #[test]
    fn test_cache_stats_default() {
        let stats = CacheStats::default();
        assert_eq!(stats.total_hits, 0);
        assert_eq!(stats.total_misses, 0);
        assert_eq!(stats.total_expired, 0);
        assert_eq!(stats.cache_size, 0);
    }
}
