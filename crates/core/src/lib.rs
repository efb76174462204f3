//! # sc-core
//!
//! Job orchestration for slidecast: turns a slide deck into per-slide
//! narration, quizzes and videos while callers watch progress live.
//!
//! This crate provides:
//! - A bounded job store and the job state machine
//! - Per-job fan-out of progress messages to subscribers
//! - The pipeline engine that drives collaborators slide by slide
//! - Collaborator traits with mock, JSON and external-command adapters
//! - Configuration loading from the `.slidecast/` directory
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`collaborators`]: Collaborator traits and adapters
//! - [`engine`]: Pipeline engine, worker pool and quiz retry
//! - [`state`]: Job store, notifier and job manager
//! - [`service`]: Orchestration context with the timeout watchdog
//! - [`error`]: Error types shared across modules

pub mod collaborators;
pub mod config;
pub mod engine;
pub mod error;
pub mod service;
pub mod state;

pub use service::{JobRequest, SlideCast};
