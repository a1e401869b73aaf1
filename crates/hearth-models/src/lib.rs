//! Local model discovery and status for Hearth.
//!
//! This crate talks to a locally running Ollama server and keeps a short-lived
//! status cache in front of it.
//!
//! # Components
//!
//! - **Probe**: [`OllamaProbe`], bounded-timeout HTTP calls for liveness,
//!   listing, force-loading and residency checks
//! - **Cache**: [`StatusCache`], last known status per model with lazy expiry
//! - **Service**: [`LocalModelService`], the cache-first query/control API
//!
//! None of the public operations return errors. An absent or misbehaving
//! server shows up as empty listings, `false`, or an error string on the
//! cached [`ModelStatus`].

pub mod cache;
pub mod coalesce;
pub mod config;
pub mod ollama;
pub mod service;

pub use cache::{CacheEntry, CacheStats, StatusCache};
pub use coalesce::ProbeCoalescer;
pub use config::{CacheConfig, ConfigError, ProbeConfig, ServiceConfig, ServiceSection};
pub use hearth_abstraction::{
    Clock, LoadOutcome, ManualClock, ModelDetails, ModelProbe, ModelStatus, ProbeError,
    RawModelDescriptor, SystemClock,
};
pub use ollama::OllamaProbe;
pub use service::LocalModelService;
