//! Live update messages delivered to job subscribers.
//!
//! Every message carries the job id and a timestamp next to a `type` tag and
//! a kind-specific `data` object:
//! ```json
//! {
//!   "type": "progress",
//!   "job_id": "uuid-here",
//!   "data": { "progress": 42, "current_slide": 3, ... },
//!   "timestamp": "2024-01-01T00:00:00Z"
//! }
//! ```
//!
//! Slide-level changes have no message of their own; they travel inside
//! `progress` as the full slide-progress snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::job_models::{Job, JobId, JobState, SlideProgress};
use crate::result_models::JobResult;

/// Initial snapshot sent to a subscriber right after it subscribes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ConnectedData {
    pub state: JobState,
    pub progress: u8,
    pub current_slide: Option<u32>,
    pub total_slides: Option<usize>,
    pub current_step: Option<String>,
}

/// Progress payload, carrying the full slide-progress snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ProgressData {
    pub progress: u8,
    pub current_slide: Option<u32>,
    pub current_step: Option<String>,
    pub slide_progress: Vec<SlideProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct CompletedData {
    pub result: JobResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct ErrorData {
    pub error: String,
}

/// Message published to the subscribers of one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobMessage {
    /// Snapshot of the job at subscription time.
    Connected {
        #[ts(type = "string")]
        job_id: JobId,
        data: ConnectedData,
        timestamp: DateTime<Utc>,
    },

    /// Progress or slide sub-state changed.
    Progress {
        #[ts(type = "string")]
        job_id: JobId,
        data: ProgressData,
        timestamp: DateTime<Utc>,
    },

    /// The job completed; carries the full result.
    Completed {
        #[ts(type = "string")]
        job_id: JobId,
        data: CompletedData,
        timestamp: DateTime<Utc>,
    },

    /// The job failed with a terminal error.
    Error {
        #[ts(type = "string")]
        job_id: JobId,
        data: ErrorData,
        timestamp: DateTime<Utc>,
    },

    /// The job was cancelled by request.
    Cancelled {
        #[ts(type = "string")]
        job_id: JobId,
        timestamp: DateTime<Utc>,
    },
}

impl JobMessage {
    pub fn connected(job: &Job) -> Self {
        Self::Connected {
            job_id: job.id,
            data: ConnectedData {
                state: job.state,
                progress: job.progress,
                current_slide: job.current_slide,
                total_slides: job.total_slides,
                current_step: job.current_step.clone(),
            },
            timestamp: Utc::now(),
        }
    }

    pub fn progress(job: &Job) -> Self {
        Self::Progress {
            job_id: job.id,
            data: ProgressData {
                progress: job.progress,
                current_slide: job.current_slide,
                current_step: job.current_step.clone(),
                slide_progress: job.slide_progress.clone(),
            },
            timestamp: Utc::now(),
        }
    }

    pub fn completed(result: JobResult) -> Self {
        Self::Completed {
            job_id: result.job_id,
            data: CompletedData { result },
            timestamp: Utc::now(),
        }
    }

    pub fn error(job_id: JobId, error: impl Into<String>) -> Self {
        Self::Error {
            job_id,
            data: ErrorData {
                error: error.into(),
            },
            timestamp: Utc::now(),
        }
    }

    pub fn cancelled(job_id: JobId) -> Self {
        Self::Cancelled {
            job_id,
            timestamp: Utc::now(),
        }
    }

    /// The job this message belongs to.
    pub fn job_id(&self) -> JobId {
        match self {
            Self::Connected { job_id, .. }
            | Self::Progress { job_id, .. }
            | Self::Completed { job_id, .. }
            | Self::Error { job_id, .. }
            | Self::Cancelled { job_id, .. } => *job_id,
        }
    }

    /// Whether this message ends the job's stream of updates.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Error { .. } | Self::Cancelled { .. }
        )
    }
}
