//! Configuration file loader for the `.slidecast/` directory.
//!
//! Settings come from three layers, later ones winning:
//! 1. Built-in defaults
//! 2. `.slidecast/config.toml`
//! 3. `SLIDECAST_*` environment variables (scalar engine settings only)

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use sc_protocol::config_models::{EngineConfig, GlobalConfig};
use std::path::Path;
use std::str::FromStr;

/// Prefix shared by all environment overrides.
pub const ENV_PREFIX: &str = "SLIDECAST_";

/// Loads configuration from the `.slidecast/` directory under `root`.
///
/// # Returns
///
/// An `AppConfig` with file values and environment overrides applied. A
/// missing directory or `config.toml` yields the defaults rather than an error.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - `config.toml` exists but cannot be read
/// - `config.toml` has invalid TOML syntax
/// - An environment override cannot be parsed
/// - A resulting value is out of range
///
/// # Example
///
/// ```rust,no_run
/// use sc_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Store keeps {} jobs", config.engine.max_jobs);
/// # Ok(())
/// # }
/// ```
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    load_config_with_env(root, |key| std::env::var(key).ok()).await
}

/// Same as [`load_config`], reading overrides through `lookup`.
pub async fn load_config_with_env<F>(root: &Path, lookup: F) -> ConfigResult<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let global = load_global_config(root)?;
    let mut config = AppConfig::from(global);

    apply_env_overrides(&mut config.engine, lookup)?;
    config.validate()?;

    tracing::debug!(
        max_concurrent_jobs = config.engine.max_concurrent_jobs,
        max_jobs = config.engine.max_jobs,
        "Configuration loaded"
    );

    Ok(config)
}

/// Loads `config.toml`, falling back to defaults when it is absent.
fn load_global_config(root: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = root.join(".slidecast").join("config.toml");

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: config_path,
        source,
    })
}

/// Overrides scalar engine settings from `SLIDECAST_*` variables.
pub fn apply_env_overrides<F>(engine: &mut EngineConfig, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    override_value(&lookup, "MAX_CONCURRENT_JOBS", &mut engine.max_concurrent_jobs)?;
    override_value(&lookup, "MAX_JOBS", &mut engine.max_jobs)?;
    override_value(&lookup, "MAX_SLIDES", &mut engine.max_slides)?;
    override_value(&lookup, "JOB_TIMEOUT_MINUTES", &mut engine.job_timeout_minutes)?;
    override_value(&lookup, "WORKER_THREADS", &mut engine.worker_threads)?;

    if let Some(language) = lookup(&format!("{ENV_PREFIX}DEFAULT_LANGUAGE")) {
        engine.default_language = language.trim().to_string();
    }

    if let Some(languages) = lookup(&format!("{ENV_PREFIX}SUPPORTED_LANGUAGES")) {
        engine.supported_languages = languages
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    Ok(())
}

fn override_value<F, T>(lookup: &F, name: &str, target: &mut T) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let var = format!("{ENV_PREFIX}{name}");
    if let Some(value) = lookup(&var) {
        *target = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnv { var, value })?;
    }
    Ok(())
}
