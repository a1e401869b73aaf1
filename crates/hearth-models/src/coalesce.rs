//! Per-model async locks for collapsing concurrent residency probes.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Hands out one async lock per model name.
///
/// A caller that misses the cache takes the lock for its model, re-checks the
/// cache, and only probes if the entry is still missing. Concurrent callers
/// queue on the same lock and find the first caller's result in the cache.
#[derive(Debug, Default)]
pub struct ProbeCoalescer {
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProbeCoalescer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive probing rights on `name`.
    pub async fn acquire(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut inflight = self.inflight.lock().await;
            Arc::clone(
                inflight
                    .entry(name.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    /// Drop locks nobody is holding or waiting on.
    pub async fn prune(&self) {
        let mut inflight = self.inflight.lock().await;
        inflight.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Number of model names with a lock allocated.
    pub async fn tracked(&self) -> usize {
        self.inflight.lock().await.len()
    }
}
