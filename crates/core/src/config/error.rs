//! Error types for configuration loading.
//!
//! This module defines all errors that can occur while reading
//! `.slidecast/config.toml` and applying environment overrides.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// An environment override could not be parsed.
    #[error("Invalid value for environment variable {var}: {value:?}")]
    InvalidEnv { var: String, value: String },

    /// A setting is out of its allowed range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
