//! Configuration loader with layered overrides.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Config file (TOML; missing file is not an error)
//! 3. Environment variables (`VIGIL_*`)
//!
//! Each layer overrides the previous.

use super::{ConfigError, VigilConfig};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```ignore
/// let config = ConfigLoader::new()
///     .with_file("vigil.toml")
///     .skip_env_vars() // for deterministic tests
///     .load()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    skip_env: bool,
}

impl ConfigLoader {
    /// Creates a loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the config file path.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Skips environment variable overrides.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Loads and merges configuration from all layers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed, or if an environment override is malformed. A missing
    /// file is silently skipped.
    pub fn load(&self) -> Result<VigilConfig, ConfigError> {
        let mut config = VigilConfig::default();

        if let Some(path) = &self.file {
            if let Some(file_config) = load_file(path)? {
                debug!(path = %path.display(), "loaded config file");
                config = file_config;
            }
        }

        if !self.skip_env {
            apply_env_overrides(&mut config)?;
        }

        Ok(config)
    }
}

fn load_file(path: &Path) -> Result<Option<VigilConfig>, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "config file absent, using defaults");
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config = toml::from_str(&text).map_err(|err| ConfigError::Parse {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    Ok(Some(config))
}

fn apply_env_overrides(config: &mut VigilConfig) -> Result<(), ConfigError> {
    if let Ok(val) = std::env::var("VIGIL_HTTP_BIND") {
        config.core.http.bind = val;
    }
    if let Ok(val) = std::env::var("VIGIL_HTTP_PORT") {
        config.core.http.port = val.parse().map_err(|_| ConfigError::InvalidEnvVar {
            var: "VIGIL_HTTP_PORT",
            reason: "expected a port number",
        })?;
    }
    if let Ok(val) = std::env::var("VIGIL_ACTIVE_MODULES") {
        config.core.active_modules = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
    Ok(())
}
