//! Consumer-facing query/control API over the probe client and status cache.

use futures::future::join_all;
use hearth_abstraction::{
    Clock, LoadOutcome, ModelProbe, ModelStatus, RawModelDescriptor, SystemClock,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::cache::{CacheStats, StatusCache};
use crate::coalesce::ProbeCoalescer;
use crate::config::ServiceConfig;
use crate::ollama::OllamaProbe;

/// Entry point for local model discovery and status.
///
/// Reads are cache-first and probe on a miss; loads always go to the probe
/// target. Every operation is total: an absent target yields empty lists,
/// `false`, or a cached error string, never an error.
///
/// Cloning is cheap and clones share the same cache.
#[derive(Clone)]
pub struct LocalModelService {
    inner: Arc<Inner>,
}

struct Inner {
    probe: Arc<dyn ModelProbe>,
    cache: StatusCache,
    /// Present when concurrent residency probes for one model are collapsed.
    coalescer: Option<ProbeCoalescer>,
}

impl LocalModelService {
    /// Create a service talking to Ollama as configured.
    #[must_use]
    pub fn new(config: &ServiceConfig) -> Self {
        let probe = Arc::new(OllamaProbe::new(&config.probe));
        Self::with_probe(probe, Arc::new(SystemClock::new()), config)
    }

    /// Create a service over an arbitrary probe and clock.
    #[must_use]
    pub fn with_probe(
        probe: Arc<dyn ModelProbe>,
        clock: Arc<dyn Clock>,
        config: &ServiceConfig,
    ) -> Self {
        let coalescer = config.service.coalesce_probes.then(ProbeCoalescer::new);
        Self {
            inner: Arc::new(Inner {
                probe,
                cache: StatusCache::with_clock(config.cache.freshness_window(), clock),
                coalescer,
            }),
        }
    }

    /// Status of every installed model.
    ///
    /// Listed models are always reported available; residency comes from the
    /// cache when fresh and from a probe otherwise. Empty when the target is down.
    pub async fn get_all_model_statuses(&self) -> Vec<(String, ModelStatus)> {
        let models = self.inner.probe.list_models().await;
        debug!(count = models.len(), "Resolving model statuses");

        join_all(models.into_iter().map(|model| async move {
            let status = self.resolve_listed(&model).await;
            (model.name, status)
        }))
        .await
    }

    /// Whether `name` is resident. Cache-first; probes and caches on a miss.
    ///
    /// A failed probe reports `false` and leaves the reason on the cached status.
    pub async fn is_model_loaded(&self, name: &str) -> bool {
        self.resolve(name, false, None).await.is_loaded
    }

    /// Force `name` into memory on the probe target.
    ///
    /// Bypasses the cache. On success the cached status records the load time;
    /// on failure it records the error and `false` is returned.
    pub async fn load_model(&self, name: &str) -> bool {
        match self.inner.probe.load_model(name).await {
            LoadOutcome::Loaded { elapsed } => {
                self.inner.cache.put(name, ModelStatus::loaded(elapsed));
                true
            }
            LoadOutcome::Failed { error } => {
                self.inner.cache.put(name, ModelStatus::failed(error));
                false
            }
        }
    }

    /// Forget the cached status of `name`.
    ///
    /// Ollama has no unload primitive; models age out of its memory on their
    /// own. This only clears local state and always reports success. It does
    /// not mean the target freed any memory.
    #[allow(clippy::unused_async)]
    pub async fn unload_model(&self, name: &str) -> bool {
        self.inner.cache.remove(name);
        info!(model = %name, "Cleared cached status; the target unloads models on its own schedule");
        true
    }

    /// Point all future probes at `address` and drop every cached status.
    pub fn set_base_address(&self, address: &str) {
        self.inner.probe.set_base_url(address);
        self.inner.cache.invalidate_all();
        info!(base_url = %self.inner.probe.base_url(), "Probe target changed");
    }

    /// The address probes are currently sent to.
    pub fn get_base_address(&self) -> String {
        self.inner.probe.base_url()
    }

    /// Liveness of the probe target.
    pub async fn is_running(&self) -> bool {
        self.inner.probe.is_running().await
    }

    /// Raw installed-model listing.
    pub async fn list_models(&self) -> Vec<RawModelDescriptor> {
        self.inner.probe.list_models().await
    }

    /// The cached status of `name`, if fresh. Never probes.
    pub fn cached_status(&self, name: &str) -> Option<ModelStatus> {
        self.inner.cache.get(name)
    }

    /// Snapshot of status cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    async fn resolve_listed(&self, model: &RawModelDescriptor) -> ModelStatus {
        let mut status = self.resolve(&model.name, true, model.size).await;
        status.is_available = true;
        if model.size.is_some() {
            status.memory_bytes = model.size;
        }
        status
    }

    async fn resolve(&self, name: &str, listed: bool, size: Option<u64>) -> ModelStatus {
        if let Some(status) = self.inner.cache.get(name) {
            return status;
        }

        let Some(coalescer) = &self.inner.coalescer else {
            return self.probe_and_cache(name, listed, size).await;
        };

        let guard = coalescer.acquire(name).await;
        // Whoever held the lock before us may have filled the entry.
        let status = match self.inner.cache.get(name) {
            Some(status) => status,
            None => self.probe_and_cache(name, listed, size).await,
        };
        drop(guard);
        coalescer.prune().await;
        status
    }

    async fn probe_and_cache(&self, name: &str, listed: bool, size: Option<u64>) -> ModelStatus {
        let status = match self.inner.probe.check_model_loaded(name).await {
            Ok(is_loaded) => ModelStatus::probed(is_loaded, listed),
            Err(e) => {
                debug!(model = %name, error = %e, "Residency probe failed");
                ModelStatus::probed(false, listed).with_error(e.user_message())
            }
        }
        .with_memory_bytes(size);

        self.inner.cache.put(name, status.clone());
        status
    }
}

impl std::fmt::Debug for LocalModelService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalModelService")
            .field("base_url", &self.inner.probe.base_url())
            .field("cache", &self.inner.cache)
            .field("coalesce_probes", &self.inner.coalescer.is_some())
            .finish()
    }
}
