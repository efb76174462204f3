//! Runtime job state models.
//!
//! This module defines the structures for tracking a deck-to-video job from
//! submission to one of its terminal states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Opaque job identifier, generated at creation.
pub type JobId = Uuid;

/// Lifecycle state of a job.
///
/// The state progresses through these values during normal execution:
/// Pending -> Processing -> Completed
///
/// Special states:
/// - Failed: the run hit an error outside the per-slide boundary
/// - Cancelled: the caller requested cancellation
///
/// Completed, Failed and Cancelled are terminal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Job has been admitted but slide count is not known yet.
    Pending,

    /// Slides are being processed.
    Processing,

    /// Job finished and its result is available.
    Completed,

    /// Job terminated with an error.
    Failed,

    /// Job was cancelled by request.
    Cancelled,
}

impl JobState {
    /// Returns true for states that have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns true for states counted by admission control.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one of a slide's independently tracked stages.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum SlideState {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SlideState {
    /// Whether moving from `self` to `next` keeps the sub-state from regressing.
    ///
    /// Setting the current value again is allowed; Completed and Failed are final.
    pub fn can_advance_to(self, next: SlideState) -> bool {
        match (self, next) {
            (current, next) if current == next => true,
            (Self::Pending, _) => true,
            (Self::Processing, Self::Completed | Self::Failed) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SlideState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress record for a single slide.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct SlideProgress {
    /// Slide index in the source deck. Not necessarily contiguous.
    pub slide_number: u32,
    pub narration: SlideState,
    pub quiz: SlideState,
    pub video: SlideState,
    /// Set when any stage for this slide fails.
    pub error: Option<String>,
}

impl SlideProgress {
    pub fn new(slide_number: u32) -> Self {
        Self {
            slide_number,
            narration: SlideState::Pending,
            quiz: SlideState::Pending,
            video: SlideState::Pending,
            error: None,
        }
    }
}

/// Partial update applied to one slide's progress record.
///
/// Only the fields that are `Some` are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideUpdate {
    pub narration: Option<SlideState>,
    pub quiz: Option<SlideState>,
    pub video: Option<SlideState>,
    pub error: Option<String>,
}

impl SlideUpdate {
    pub fn narration(state: SlideState) -> Self {
        Self {
            narration: Some(state),
            ..Self::default()
        }
    }

    pub fn quiz(state: SlideState) -> Self {
        Self {
            quiz: Some(state),
            ..Self::default()
        }
    }

    pub fn video(state: SlideState) -> Self {
        Self {
            video: Some(state),
            ..Self::default()
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Parameters captured when a job is submitted. Immutable afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct JobParams {
    /// Name of the uploaded deck.
    pub filename: String,

    /// Target language code for narration, quiz and speech (e.g. "en").
    pub language: String,

    /// Upper bound on the number of slides processed.
    pub max_slides: usize,

    /// Whether per-slide and final videos are produced.
    pub generate_video: bool,

    /// Whether quiz questions are produced.
    pub generate_quiz: bool,
}

/// Full state of a single job.
///
/// Snapshots of this record are what status queries return.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct Job {
    #[ts(type = "string")]
    pub id: JobId,

    pub state: JobState,

    /// Percentage in 0..=100. Never decreases while Processing.
    pub progress: u8,

    /// Slide number of the slide being processed.
    pub current_slide: Option<u32>,

    /// Number of slides selected for processing, known after extraction.
    pub total_slides: Option<usize>,

    /// Human-readable label of the active pipeline stage.
    pub current_step: Option<String>,

    /// One record per processed slide, in deck order.
    pub slide_progress: Vec<SlideProgress>,

    /// Terminal error description, only set on Failed.
    pub error: Option<String>,

    pub params: JobParams,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a Pending job for the given parameters.
    pub fn new(params: JobParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            state: JobState::Pending,
            progress: 0,
            current_slide: None,
            total_slides: None,
            current_step: Some("Queued".to_string()),
            slide_progress: Vec::new(),
            error: None,
            params,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Look up the progress record of a slide by its deck number.
    pub fn slide_mut(&mut self, slide_number: u32) -> Option<&mut SlideProgress> {
        self.slide_progress
            .iter_mut()
            .find(|slide| slide.slide_number == slide_number)
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id,
            filename: self.params.filename.clone(),
            state: self.state,
            progress: self.progress,
            created_at: self.created_at,
        }
    }
}

/// Brief job description for listings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct JobSummary {
    #[ts(type = "string")]
    pub id: JobId,
    pub filename: String,
    pub state: JobState,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
}
