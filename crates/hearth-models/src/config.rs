//! Configuration for the local model status layer.
//!
//! Loaded from a TOML file with `[probe]`, `[cache]` and `[service]` tables.
//! Every field has a default, so an empty or missing file yields a working
//! configuration pointed at `http://localhost:11434`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default address of a local Ollama server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Environment variable Ollama itself reads for its listen address.
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading the config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Base URL is empty.
    #[error("Invalid base URL: must not be empty")]
    EmptyBaseUrl,

    /// A timeout is zero.
    #[error("Invalid {0} timeout: must be greater than 0")]
    InvalidTimeout(&'static str),

    /// Freshness window is zero.
    #[error("Invalid freshness window: must be greater than 0")]
    InvalidFreshnessWindow,
}

/// Probe client settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Address of the model-serving process.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bound on the liveness check (default: 5).
    #[serde(default = "default_liveness_timeout_secs")]
    pub liveness_timeout_secs: u64,

    /// Bound on the 1-token residency probe (default: 10).
    #[serde(default = "default_residency_timeout_secs")]
    pub residency_timeout_secs: u64,

    /// Bound on the installed-model listing (default: 10).
    #[serde(default = "default_list_timeout_secs")]
    pub list_timeout_secs: u64,

    /// Bound on an explicit load (default: 120). Cold loads of large models are slow.
    #[serde(default = "default_load_timeout_secs")]
    pub load_timeout_secs: u64,
}

/// Status cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Seconds a cached status stays fresh (default: 30).
    #[serde(default = "default_freshness_window_secs")]
    pub freshness_window_secs: u64,
}

/// Query/control API settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceSection {
    /// Collapse concurrent residency probes for the same model into one (default: false).
    #[serde(default)]
    pub coalesce_probes: bool,
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceConfig {
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub service: ServiceSection,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_liveness_timeout_secs() -> u64 {
    5
}

fn default_residency_timeout_secs() -> u64 {
    10
}

fn default_list_timeout_secs() -> u64 {
    10
}

fn default_load_timeout_secs() -> u64 {
    120
}

fn default_freshness_window_secs() -> u64 {
    30
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            liveness_timeout_secs: default_liveness_timeout_secs(),
            residency_timeout_secs: default_residency_timeout_secs(),
            list_timeout_secs: default_list_timeout_secs(),
            load_timeout_secs: default_load_timeout_secs(),
        }
    }
}

impl ProbeConfig {
    /// Get the liveness timeout as a Duration.
    #[must_use]
    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_secs(self.liveness_timeout_secs)
    }

    /// Get the residency probe timeout as a Duration.
    #[must_use]
    pub fn residency_timeout(&self) -> Duration {
        Duration::from_secs(self.residency_timeout_secs)
    }

    /// Get the listing timeout as a Duration.
    #[must_use]
    pub fn list_timeout(&self) -> Duration {
        Duration::from_secs(self.list_timeout_secs)
    }

    /// Get the load timeout as a Duration.
    #[must_use]
    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { freshness_window_secs: default_freshness_window_secs() }
    }
}

impl CacheConfig {
    /// Get the freshness window as a Duration.
    #[must_use]
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }
}

impl ServiceConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    /// Returns `ConfigError` if the text is not valid TOML or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.probe.base_url = normalize_base_url(&config.probe.base_url);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file exists but cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Apply `OLLAMA_HOST` from the process environment, if set.
    #[must_use]
    pub fn apply_env(self) -> Self {
        let host = std::env::var(OLLAMA_HOST_ENV).ok();
        self.with_host_override(host.as_deref())
    }

    /// Override the base URL with a host string in any of Ollama's accepted forms.
    #[must_use]
    pub fn with_host_override(mut self, host: Option<&str>) -> Self {
        if let Some(host) = host.map(str::trim).filter(|h| !h.is_empty()) {
            self.probe.base_url = normalize_base_url(host);
        }
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns `ConfigError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }

        let timeouts = [
            ("liveness", self.probe.liveness_timeout_secs),
            ("residency", self.probe.residency_timeout_secs),
            ("list", self.probe.list_timeout_secs),
            ("load", self.probe.load_timeout_secs),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::InvalidTimeout(*name));
        }

        if self.cache.freshness_window_secs == 0 {
            return Err(ConfigError::InvalidFreshnessWindow);
        }

        Ok(())
    }
}

/// Normalize a probe address: add `http://` when no scheme is given and strip
/// trailing slashes.
///
/// `OLLAMA_HOST` is commonly set to a bare `host:port` such as `0.0.0.0:11434`.
#[must_use]
pub fn normalize_base_url(address: &str) -> String {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_service_config_default() {
        let config = ServiceConfig::default();
        assert_eq!(config.probe.base_url, "http://localhost:11434");
        assert_eq!(config.probe.liveness_timeout(), Duration::from_secs(5));
        assert_eq!(config.probe.residency_timeout(), Duration::from_secs(10));
        assert_eq!(config.probe.list_timeout(), Duration::from_secs(10));
        assert_eq!(config.probe.load_timeout(), Duration::from_secs(120));
        assert_eq!(config.cache.freshness_window(), Duration::from_secs(30));
        assert!(!config.service.coalesce_probes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ServiceConfig::from_toml_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = ServiceConfig::from_toml_str(
            r#"
[probe]
base_url = "192.168.1.20:11434/"
load_timeout_secs = 300

[cache]
freshness_window_secs = 5

[service]
coalesce_probes = true
"#,
        )
        .unwrap();

        assert_eq!(config.probe.base_url, "http://192.168.1.20:11434");
        assert_eq!(config.probe.load_timeout_secs, 300);
        assert_eq!(config.probe.liveness_timeout_secs, 5);
        assert_eq!(config.cache.freshness_window_secs, 5);
        assert!(config.service.coalesce_probes);
    }

    #[test]
    fn test_validation_invalid_timeout() {
        let mut config = ServiceConfig::default();
        config.probe.residency_timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout("residency"))));
    }

    #[test]
    fn test_validation_invalid_window() {
        let result = ServiceConfig::from_toml_str("[cache]\nfreshness_window_secs = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidFreshnessWindow)));
    }

    #[test]
    fn test_validation_empty_base_url() {
        let result = ServiceConfig::from_toml_str("[probe]\nbase_url = \"  \"\n");
        assert!(matches!(result, Err(ConfigError::EmptyBaseUrl)));
    }

    #[test]
    fn test_invalid_toml() {
        let result = ServiceConfig::from_toml_str("[probe\nbase_url = 1");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ServiceConfig::load(&temp.path().join("hearth.toml")).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hearth.toml");
        std::fs::write(&path, "[probe]\nbase_url = \"http://gpu-box:11434\"\n").unwrap();

        let config = ServiceConfig::load(&path).unwrap();
        assert_eq!(config.probe.base_url, "http://gpu-box:11434");
    }

    #[test]
    fn test_host_override() {
        let config = ServiceConfig::default().with_host_override(Some("0.0.0.0:11434"));
        assert_eq!(config.probe.base_url, "http://0.0.0.0:11434");

        let config = ServiceConfig::default().with_host_override(Some(""));
        assert_eq!(config.probe.base_url, DEFAULT_BASE_URL);

        let config = ServiceConfig::default().with_host_override(None);
        assert_eq!(config.probe.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://localhost:11434/"), "http://localhost:11434");
        assert_eq!(normalize_base_url("https://ollama.lan"), "https://ollama.lan");
        assert_eq!(normalize_base_url("127.0.0.1:8080"), "http://127.0.0.1:8080");
        assert_eq!(normalize_base_url("   "), "");
    }
}
