//! State management for jobs.
//!
//! This module provides:
//! - Bounded job storage with FIFO eviction
//! - The job state machine
//! - Per-job fan-out of live updates
//! - JobManager, the single entry point for job mutation

pub mod job;
pub mod manager;
pub mod notifier;
pub mod store;
