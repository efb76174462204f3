//! Configuration models that aggregate all settings.
//!
//! This module provides the unified `AppConfig` structure that combines the
//! engine limits and the external command table into a single object.

use crate::config::error::{ConfigError, ConfigResult};
use sc_protocol::config_models::{CommandConfig, EngineConfig, GlobalConfig};

/// Longest accepted job budget: one week.
pub const MAX_JOB_TIMEOUT_MINUTES: u64 = 7 * 24 * 60;

/// Unified application configuration loaded from `.slidecast/config.toml`.
///
/// # Example
///
/// ```rust,no_run
/// use sc_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("At most {} concurrent jobs", config.engine.max_concurrent_jobs);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Engine limits and defaults.
    pub engine: EngineConfig,

    /// External programs backing the collaborators.
    pub commands: CommandConfig,
}

impl AppConfig {
    /// Check that every limit is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        let engine = &self.engine;

        for (name, value) in [
            ("max_concurrent_jobs", engine.max_concurrent_jobs),
            ("max_jobs", engine.max_jobs),
            ("max_slides", engine.max_slides),
            ("worker_threads", engine.worker_threads),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidConfig(format!(
                    "{name} must be at least 1"
                )));
            }
        }

        if !(1..=MAX_JOB_TIMEOUT_MINUTES).contains(&engine.job_timeout_minutes) {
            return Err(ConfigError::InvalidConfig(format!(
                "job_timeout_minutes must be between 1 and {MAX_JOB_TIMEOUT_MINUTES}"
            )));
        }

        if !engine.supports_language(&engine.default_language) {
            return Err(ConfigError::InvalidConfig(format!(
                "default_language {:?} is not in supported_languages",
                engine.default_language
            )));
        }

        Ok(())
    }
}

impl From<GlobalConfig> for AppConfig {
    fn from(global: GlobalConfig) -> Self {
        Self {
            engine: global.engine,
            commands: global.commands,
        }
    }
}
