//! Result models produced by a completed job.
//!
//! A [`JobResult`] is created exactly once per job, when the pipeline has
//! processed every selected slide.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::job_models::JobId;

/// Difficulty label attached to a quiz question.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

/// A single multiple-choice question.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct QuizQuestion {
    pub question: String,

    /// Exactly four answer options.
    pub options: Vec<String>,

    /// One of `options`.
    pub answer: String,

    pub difficulty: Difficulty,
}

/// Validated set of quiz questions for one slide.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default, TS)]
pub struct QuizSet {
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

impl QuizSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Outputs produced for one slide.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct SlideResult {
    pub slide_number: u32,
    pub text: String,
    pub narration: Option<String>,
    pub quiz: Option<QuizSet>,

    /// Artifact references returned by the speech, image and video collaborators.
    pub audio_path: Option<String>,
    pub image_path: Option<String>,
    pub video_path: Option<String>,
}

impl SlideResult {
    pub fn new(slide_number: u32, text: impl Into<String>) -> Self {
        Self {
            slide_number,
            text: text.into(),
            narration: None,
            quiz: None,
            audio_path: None,
            image_path: None,
            video_path: None,
        }
    }
}

/// Final output of a completed job.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct JobResult {
    #[ts(type = "string")]
    pub job_id: JobId,
    pub filename: String,
    pub language: String,
    pub slides: Vec<SlideResult>,

    /// Stitched video of all slides. Absent when no slide video was produced
    /// or stitching failed.
    pub final_video_path: Option<String>,

    /// Wall-clock duration of the run in seconds.
    pub processing_time_seconds: f64,

    pub created_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}
