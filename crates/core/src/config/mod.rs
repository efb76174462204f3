//! Configuration loading and management.
//!
//! This module loads engine limits and collaborator commands from the
//! `.slidecast/` directory, with environment variable overrides.

pub mod error;
pub mod loader;
pub mod models;
