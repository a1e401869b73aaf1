//! Shared vocabulary for Hearth.
//!
//! This crate defines the status types, the probe seam, and the clock seam used
//! by the local model status layer. Concrete probe implementations live in
//! `hearth-models`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// An error raised while talking to the model-serving process.
///
/// Probe errors never escape the public service surface; they are logged and
/// folded into `false`, an empty listing, or an error string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The serving process is not listening at the configured address.
    #[error("Probe target unreachable: {0}")]
    Unreachable(String),

    /// The request exceeded its bound.
    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),

    /// The serving process answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// The HTTP status code.
        status: u16,
        /// The target's error text, verbatim when it sent one.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Decode Error: {0}")]
    Decode(String),
}

impl ProbeError {
    /// Returns the text a consumer should see for this failure.
    ///
    /// HTTP failures surface the target's own message so an unknown-model
    /// rejection reads the way the serving process phrased it.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Last known status of one installed model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    /// Whether the model appears resident in the serving process's memory.
    pub is_loaded: bool,
    /// Whether the model is installed at all.
    pub is_available: bool,
    /// Duration of the most recent explicit load performed by this process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_time_ms: Option<u64>,
    /// Reported size of the model artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_bytes: Option<u64>,
    /// Last probe failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelStatus {
    /// Status after a successful explicit load.
    #[must_use]
    pub fn loaded(load_time: Duration) -> Self {
        Self {
            is_loaded: true,
            is_available: true,
            load_time_ms: Some(u64::try_from(load_time.as_millis()).unwrap_or(u64::MAX)),
            memory_bytes: None,
            error: None,
        }
    }

    /// Status for a model the target refused or could not be reached for.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            is_loaded: false,
            is_available: false,
            load_time_ms: None,
            memory_bytes: None,
            error: Some(error.into()),
        }
    }

    /// Status derived from a residency probe.
    ///
    /// A resident model is necessarily available; a non-resident one is only
    /// known to be available when the caller saw it in a listing.
    #[must_use]
    pub fn probed(is_loaded: bool, listed: bool) -> Self {
        Self {
            is_loaded,
            is_available: is_loaded || listed,
            ..Self::default()
        }
    }

    /// Records why the last probe failed.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Sets the reported artifact size.
    #[must_use]
    pub fn with_memory_bytes(mut self, memory_bytes: Option<u64>) -> Self {
        self.memory_bytes = memory_bytes;
        self
    }

    /// Restores the loaded-implies-available invariant.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.is_loaded {
            self.is_available = true;
        }
        self
    }
}

/// Optional details block of a listed model. Passed through opaquely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDetails {
    /// Weights file format, e.g. "gguf".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Primary model family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    /// Every family the model belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub families: Option<Vec<String>>,
    /// Parameter count as reported, e.g. "1.2B".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_size: Option<String>,
    /// Quantization level, e.g. "Q8_0".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization_level: Option<String>,
}

/// One entry of the serving process's installed-model listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawModelDescriptor {
    /// The model name. This is the model's identity within one probe target.
    pub name: String,
    /// Artifact size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Content digest of the model artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Last modification time, as the target formats it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    /// Format and family details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ModelDetails>,
}

impl RawModelDescriptor {
    /// Creates a descriptor carrying only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), size: None, digest: None, modified_at: None, details: None }
    }
}

/// Result of an explicit load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The target accepted the request and the model is now resident.
    Loaded {
        /// Wall-clock duration of the load call.
        elapsed: Duration,
    },
    /// The target rejected the request or could not be reached.
    Failed {
        /// Human-readable failure reason.
        error: String,
    },
}

impl LoadOutcome {
    /// Returns `true` for [`LoadOutcome::Loaded`].
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// Client for a locally running model-serving process.
///
/// Liveness, listing, and loading are total: failures degrade to `false`, an
/// empty listing, or [`LoadOutcome::Failed`]. The residency probe hands its
/// failure back so the caller can record the reason.
#[async_trait]
pub trait ModelProbe: Send + Sync {
    /// Liveness check against the target's version endpoint.
    async fn is_running(&self) -> bool;

    /// Installed models. Empty when the target is down or the listing fails.
    async fn list_models(&self) -> Vec<RawModelDescriptor>;

    /// Forces the target to load `name` into memory.
    async fn load_model(&self, name: &str) -> LoadOutcome;

    /// Residency probe: `Ok(true)` if `name` answers a 1-token generation in time.
    ///
    /// `Ok(false)` is for targets that can report non-residency directly.
    ///
    /// # Errors
    /// Returns the `ProbeError` when the target rejects the probe, times out,
    /// or cannot be reached.
    async fn check_model_loaded(&self, name: &str) -> Result<bool, ProbeError>;

    /// The address probes are currently sent to.
    fn base_url(&self) -> String;

    /// Retargets all future probes.
    fn set_base_url(&self, base_url: &str);
}

/// Source of milliseconds for cache expiry.
///
/// Readings only need to be comparable with each other and must never go
/// backwards.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Milliseconds since the clock's own origin.
    fn now_ms(&self) -> u64;
}

/// Monotonic clock counting from its creation.
///
/// Backed by [`Instant`], so wall-clock adjustments cannot stretch or shrink
/// a freshness window.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Clock that only moves when told to. Used to pin freshness boundaries in tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    /// Creates a clock reading `start_ms`.
    #[must_use]
    pub const fn new(start_ms: u64) -> Self {
        Self { now_ms: AtomicU64::new(start_ms) }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.now_ms.fetch_add(by, Ordering::SeqCst);
    }

    /// Sets the clock to an absolute reading.
    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loaded_status_is_available() {
        let status = ModelStatus::loaded(Duration::from_millis(1250));
        assert!(status.is_loaded);
        assert!(status.is_available);
        assert_eq!(status.load_time_ms, Some(1250));
        assert_eq!(status.error, None);
    }

    #[test]
    fn test_failed_status_carries_error() {
        let status = ModelStatus::failed("model 'ghost' not found");
        assert!(!status.is_loaded);
        assert!(!status.is_available);
        assert_eq!(status.error.as_deref(), Some("model 'ghost' not found"));
    }

    #[test]
    fn test_probed_status_never_loaded_without_available() {
        assert_eq!(ModelStatus::probed(true, false).is_available, true);
        assert_eq!(ModelStatus::probed(false, true).is_available, true);
        assert_eq!(ModelStatus::probed(false, false).is_available, false);
    }

    #[test]
    fn test_with_error_keeps_probe_flags() {
        let status = ModelStatus::probed(false, true).with_error("HTTP 500: boom");
        assert!(!status.is_loaded);
        assert!(status.is_available);
        assert_eq!(status.error.as_deref(), Some("HTTP 500: boom"));
    }

    #[test]
    fn test_normalized_restores_invariant() {
        let broken = ModelStatus { is_loaded: true, is_available: false, ..ModelStatus::default() };
        assert!(broken.normalized().is_available);
    }

    #[test]
    fn test_model_status_serializes_camel_case() {
        let status = ModelStatus::loaded(Duration::from_millis(10)).with_memory_bytes(Some(42));
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"isLoaded\":true"));
        assert!(json.contains("\"loadTimeMs\":10"));
        assert!(json.contains("\"memoryBytes\":42"));
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_descriptor_deserializes_tags_entry() {
        let json = r#"{
            "name": "llama3.2:1b",
            "size": 4500000000,
            "digest": "abc123",
            "modified_at": "2024-10-01T12:00:00Z",
            "details": {
                "format": "gguf",
                "family": "llama",
                "families": ["llama"],
                "parameter_size": "1.2B",
                "quantization_level": "Q8_0"
            },
            "model": "llama3.2:1b"
        }"#;
        let descriptor: RawModelDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.name, "llama3.2:1b");
        assert_eq!(descriptor.size, Some(4_500_000_000));
        let details = descriptor.details.unwrap();
        assert_eq!(details.quantization_level.as_deref(), Some("Q8_0"));
        assert_eq!(details.families, Some(vec!["llama".to_string()]));
    }

    #[test]
    fn test_descriptor_name_only() {
        let descriptor: RawModelDescriptor = serde_json::from_str(r#"{"name": "phi3"}"#).unwrap();
        assert_eq!(descriptor, RawModelDescriptor::named("phi3"));
    }

    #[test]
    fn test_http_error_user_message_is_verbatim() {
        let err = ProbeError::Http { status: 404, message: "model 'x' not found".to_string() };
        assert_eq!(err.user_message(), "model 'x' not found");
        assert_eq!(err.to_string(), "HTTP 404: model 'x' not found");

        let empty = ProbeError::Http { status: 500, message: String::new() };
        assert_eq!(empty.user_message(), "HTTP 500: ");
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(1_000);
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now_ms(), 3_000);
        clock.set(5);
        assert_eq!(clock.now_ms(), 5);
    }

    #[test]
    fn test_system_clock_is_monotonic_from_origin() {
        let clock = SystemClock::new();
        let first = clock.now_ms();
        std::thread::sleep(Duration::from_millis(20));
        let second = clock.now_ms();

        assert!(first < 1_000, "origin reading was {first}");
        assert!(second >= first + 20, "{first} -> {second}");
    }
}
