//! Configuration management for aot-checker
//!
//! Settings are layered, lowest priority first:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//!
//! # Environment Variables
//!
//! Overrides follow the pattern `AOT_CHECKER__<section>__<key>`, e.g.
//! - `AOT_CHECKER__SERVER__BIND_ADDR=127.0.0.1:9000`
//! - `AOT_CHECKER__RESOLVER__MODE=dynamic`
//! - `AOT_CHECKER__CACHE__RESPONSE_MAX_AGE=5m`
//!
//! # Configuration File
//!
//! Loaded from `config/aot-checker.toml` unless `AOT_CHECKER_CONFIG` points
//! elsewhere.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{
    CacheConfig, Config, ResolverConfig, ResolverMode, ServerConfig, TelemetryConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[resolver]\nmode = \"aot\"\n").unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.resolver.mode, ResolverMode::Aot);
    }

    #[test]
    fn test_validation_runs_after_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[cache]\nresponse_max_age = \"2d\"\n").unwrap();
        // "2d" is not a unit we accept, so this fails while deserializing.
        assert!(matches!(
            Config::load_from_path(config_path.clone()),
            Err(ConfigError::LoadError(_))
        ));

        fs::write(&config_path, "[cache]\nresponse_max_age = \"48h\"\n").unwrap();
        assert!(matches!(
            Config::load_from_path(config_path),
            Err(ConfigError::ValidationError(
                ValidationError::ResponseMaxAgeTooLarge { .. }
            ))
        ));
    }
}
