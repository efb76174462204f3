//! Error types for job management and pipeline execution.
//!
//! - [`JobError`]: raised at the job manager boundary
//! - [`StageError`]: raised by external collaborators
//! - [`PipelineError`]: anything that ends a whole run

use sc_protocol::job_models::{JobId, JobState};
use thiserror::Error;

/// Errors returned by the job manager.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// No job with this id is stored.
    #[error("Job not found: {0}")]
    NotFound(JobId),

    /// Admission control rejected the job.
    #[error("Too many concurrent jobs. Maximum allowed: {max}")]
    TooManyJobs { max: usize },

    /// The job exists but has no result yet.
    #[error("Job {id} not completed. Current state: {state}")]
    NotCompleted { id: JobId, state: JobState },

    /// Cooperative abort signal raised at a cancellation checkpoint.
    #[error("Job was cancelled: {0}")]
    Cancelled(JobId),

    /// The creation parameters were rejected.
    #[error("Invalid job request: {0}")]
    InvalidRequest(String),
}

/// Errors raised by pipeline collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    #[error("Failed to parse presentation: {0}")]
    Parse(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Image rendering failed: {0}")]
    Render(String),

    #[error("Video assembly failed: {0}")]
    Assembly(String),

    #[error("Video stitching failed: {0}")]
    Stitch(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The backing service or program cannot be reached.
    #[error("Collaborator not available: {0}")]
    Unavailable(String),

    /// An offloaded task panicked or was aborted.
    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Errors that terminate a whole pipeline run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Stage(#[from] StageError),
}

impl PipelineError {
    /// True when the run stopped because the job was cancelled.
    ///
    /// A cancelled run is not reported as a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Job(JobError::Cancelled(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_cancellation_is_distinguished() {
        let id = Uuid::new_v4();
        assert!(PipelineError::from(JobError::Cancelled(id)).is_cancellation());
        assert!(!PipelineError::from(JobError::NotFound(id)).is_cancellation());
        assert!(!PipelineError::from(StageError::Parse("bad zip".to_string())).is_cancellation());
    }

    #[test]
    fn test_error_messages() {
        let err = JobError::TooManyJobs { max: 3 };
        assert_eq!(err.to_string(), "Too many concurrent jobs. Maximum allowed: 3");

        let err = PipelineError::from(StageError::Parse("bad zip".to_string()));
        assert_eq!(err.to_string(), "Failed to parse presentation: bad zip");
    }
}
