//! Collaborator traits used by the pipeline and the bundle that holds them.
//!
//! Each trait covers one external operation. The pipeline only depends on
//! these contracts; adapters in [`crate::collaborators::adapters`] decide how
//! the work is actually done.

use crate::error::StageError;
use async_trait::async_trait;
use sc_protocol::result_models::QuizSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// One slide as returned by the extraction collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSlide {
    /// Index in the source deck.
    pub slide_number: u32,
    #[serde(default)]
    pub text: String,
}

impl ExtractedSlide {
    pub fn new(slide_number: u32, text: impl Into<String>) -> Self {
        Self {
            slide_number,
            text: text.into(),
        }
    }

    /// Whether the slide carries any text worth narrating.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[async_trait]
pub trait Extractor: Send + Sync {
    /// Slides of the deck at `path`, in deck order.
    async fn extract(&self, path: &Path) -> Result<Vec<ExtractedSlide>, StageError>;
}

#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, text: &str, language: &str) -> Result<String, StageError>;
}

#[async_trait]
pub trait QuizGenerator: Send + Sync {
    /// Raw, unvalidated quiz output for one slide.
    async fn generate_quiz(&self, text: &str, language: &str) -> Result<String, StageError>;
}

/// Turns raw quiz output into a trusted question set.
pub trait QuizValidator: Send + Sync {
    /// Parse and repair raw output. Malformed questions are dropped.
    fn validate(&self, raw: &str) -> Result<QuizSet, StageError>;

    /// Whether every question and option is written in `language`.
    fn check_language(&self, quiz: &QuizSet, language: &str) -> bool;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and return a reference to the audio artifact.
    async fn synthesize(&self, text: &str, language: &str) -> Result<String, StageError>;
}

#[async_trait]
pub trait ImageRenderer: Send + Sync {
    /// Render `text` as a still image and return its reference.
    async fn render(&self, text: &str) -> Result<String, StageError>;
}

#[async_trait]
pub trait VideoAssembler: Send + Sync {
    /// Combine a still image and an audio track into one video.
    async fn assemble(&self, image: &str, audio: &str) -> Result<String, StageError>;

    /// Concatenate videos in order into one.
    async fn stitch(&self, videos: &[String]) -> Result<String, StageError>;
}

/// Every collaborator one pipeline run needs.
#[derive(Clone)]
pub struct Collaborators {
    pub extractor: Arc<dyn Extractor>,
    pub narrator: Arc<dyn Narrator>,
    pub quiz_generator: Arc<dyn QuizGenerator>,
    pub quiz_validator: Arc<dyn QuizValidator>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub image: Arc<dyn ImageRenderer>,
    pub video: Arc<dyn VideoAssembler>,
}
