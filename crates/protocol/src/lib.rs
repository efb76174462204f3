//! # sc-protocol
//!
//! Core protocol definitions and data models for slidecast.
//!
//! This crate defines all shared data structures used for:
//! - Job records and per-slide progress
//! - Job results, including validated quiz questions
//! - Live update messages delivered to subscribers
//! - Configuration file parsing (TOML)
//!
//! ## Modules
//!
//! - [`job_models`]: Job state, slide progress and creation parameters
//! - [`result_models`]: Per-slide outputs and the final job result
//! - [`ipc`]: Messages fanned out to job subscribers
//! - [`config_models`]: Engine limits and external command settings
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid and chrono
//! - TypeScript generation: All types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other slidecast crates

pub mod config_models;
pub mod ipc;
pub mod job_models;
pub mod result_models;

// Re-export all public types for convenience
pub use config_models::*;
pub use ipc::*;
pub use job_models::*;
pub use result_models::*;
