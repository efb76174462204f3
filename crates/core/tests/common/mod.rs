//! Common test utilities shared by the integration tests.
//!
//! This module provides:
//! - Fixtures for engine configs, job parameters and results
//! - Collaborators whose timing the test controls
//! - Assertions over published message sequences

pub mod assertions;
pub mod collaborators;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use collaborators::*;
#[allow(unused_imports)]
pub use fixtures::*;
