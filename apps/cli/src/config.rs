//! CLI configuration loading and merging.

use anyhow::{Context, Result};
use hearth_models::ServiceConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default config file location: `<config dir>/hearth/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hearth").join("config.toml"))
}

/// Load and merge CLI configuration.
///
/// Configuration precedence:
/// 1. `--base-url`
/// 2. `OLLAMA_HOST`
/// 3. Config file (`--config` or the default location)
/// 4. Defaults
pub fn resolve(config_path: Option<&Path>, base_url: Option<&str>) -> Result<ServiceConfig> {
    let path = config_path.map(Path::to_path_buf).or_else(default_config_path);

    let config = match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading config");
            ServiceConfig::load(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => ServiceConfig::default(),
    };

    let config = config.apply_env().with_host_override(base_url);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
