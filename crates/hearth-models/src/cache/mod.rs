//! Per-model status cache with a fixed freshness window.
//!
//! Entries are overwritten on every probe and evicted lazily: a read past an
//! entry's expiry drops it and reports a miss. There is no background sweep.

pub mod cache;
pub mod types;

pub use cache::StatusCache;
pub use types::{CacheEntry, CacheStats};
