//! Mock collaborators for testing and dry runs.
//!
//! Every mock counts its calls and produces deterministic artifact
//! references such as `mock://audio/1`.

use crate::collaborators::base::{
    Collaborators, ExtractedSlide, Extractor, ImageRenderer, Narrator, QuizGenerator,
    SpeechSynthesizer, VideoAssembler,
};
use crate::collaborators::validator::JsonQuizValidator;
use crate::error::StageError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct CallCounter(AtomicUsize);

impl CallCounter {
    /// Record a call and return its 1-based number.
    fn hit(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Returns a fixed slide list, or a parse error.
pub struct MockExtractor {
    slides: Result<Vec<ExtractedSlide>, StageError>,
}

impl MockExtractor {
    pub fn new(slides: Vec<ExtractedSlide>) -> Self {
        Self { slides: Ok(slides) }
    }

    /// One slide per text, numbered from 1.
    pub fn from_texts(texts: &[&str]) -> Self {
        Self::new(
            texts
                .iter()
                .zip(1..)
                .map(|(text, number)| ExtractedSlide::new(number, *text))
                .collect(),
        )
    }

    pub fn failing(message: &str) -> Self {
        Self {
            slides: Err(StageError::Parse(message.to_string())),
        }
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    async fn extract(&self, _path: &Path) -> Result<Vec<ExtractedSlide>, StageError> {
        self.slides.clone()
    }
}

/// Prefixes the slide text, optionally failing on marked slides.
#[derive(Default)]
pub struct MockNarrator {
    fail_on: Option<String>,
    delay: Option<Duration>,
    calls: CallCounter,
}

impl MockNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail whenever the slide text contains `marker`.
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_on: Some(marker.to_string()),
            ..Self::default()
        }
    }

    /// Sleep before answering, to keep a slide in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

#[async_trait]
impl Narrator for MockNarrator {
    async fn narrate(&self, text: &str, language: &str) -> Result<String, StageError> {
        self.calls.hit();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on.as_deref().is_some_and(|marker| text.contains(marker)) {
            return Err(StageError::Generation("narration model unavailable".to_string()));
        }
        Ok(format!("[{language}] In this slide: {text}"))
    }
}

/// Replays scripted raw outputs; without a script, builds a valid quiz.
#[derive(Default)]
pub struct MockQuizGenerator {
    script: Mutex<VecDeque<String>>,
    calls: CallCounter,
}

impl MockQuizGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return these outputs in order. The last one repeats once exhausted.
    pub fn scripted<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(outputs.into_iter().map(Into::into).collect()),
            calls: CallCounter::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// A well-formed single-question quiz about `text`.
    pub fn sample_output(text: &str) -> String {
        serde_json::json!({
            "questions": [{
                "question": format!("Which of these best describes what this slide is about: {text}?"),
                "options": [text, "Something else entirely", "None of the above", "All of the above"],
                "answer": text,
                "difficulty": "easy",
            }]
        })
        .to_string()
    }
}

#[async_trait]
impl QuizGenerator for MockQuizGenerator {
    async fn generate_quiz(&self, text: &str, _language: &str) -> Result<String, StageError> {
        self.calls.hit();
        let mut script = self.script.lock().await;
        let scripted = if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        };
        Ok(scripted.unwrap_or_else(|| Self::sample_output(text)))
    }
}

/// Returns `mock://audio/N`.
#[derive(Default)]
pub struct MockSpeech {
    failing: bool,
    calls: CallCounter,
}

impl MockSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeech {
    async fn synthesize(&self, text: &str, _language: &str) -> Result<String, StageError> {
        let n = self.calls.hit();
        if self.failing {
            return Err(StageError::Unavailable("speech backend offline".to_string()));
        }
        if text.trim().is_empty() {
            return Err(StageError::Synthesis("no text to synthesize".to_string()));
        }
        Ok(format!("mock://audio/{n}"))
    }
}

/// Returns `mock://image/N`.
#[derive(Default)]
pub struct MockImage {
    calls: CallCounter,
}

impl MockImage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

#[async_trait]
impl ImageRenderer for MockImage {
    async fn render(&self, _text: &str) -> Result<String, StageError> {
        Ok(format!("mock://image/{}", self.calls.hit()))
    }
}

/// Returns `mock://video/N` and `mock://final/N`.
#[derive(Default)]
pub struct MockVideo {
    fail_stitch: bool,
    assembled: CallCounter,
    stitched: CallCounter,
}

impl MockVideo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_stitch() -> Self {
        Self {
            fail_stitch: true,
            ..Self::default()
        }
    }

    pub fn assembled(&self) -> usize {
        self.assembled.get()
    }

    pub fn stitched(&self) -> usize {
        self.stitched.get()
    }
}

#[async_trait]
impl VideoAssembler for MockVideo {
    async fn assemble(&self, _image: &str, _audio: &str) -> Result<String, StageError> {
        Ok(format!("mock://video/{}", self.assembled.hit()))
    }

    async fn stitch(&self, videos: &[String]) -> Result<String, StageError> {
        let n = self.stitched.hit();
        if self.fail_stitch {
            return Err(StageError::Stitch("encoder crashed".to_string()));
        }
        match videos {
            [] => Err(StageError::Stitch("nothing to stitch".to_string())),
            [single] => Ok(single.clone()),
            _ => Ok(format!("mock://final/{n}")),
        }
    }
}

/// Mock collaborators for a deck with the given slide texts.
pub fn mock_collaborators(texts: &[&str]) -> Collaborators {
    Collaborators {
        extractor: Arc::new(MockExtractor::from_texts(texts)),
        narrator: Arc::new(MockNarrator::new()),
        quiz_generator: Arc::new(MockQuizGenerator::new()),
        quiz_validator: Arc::new(JsonQuizValidator::new()),
        speech: Arc::new(MockSpeech::new()),
        image: Arc::new(MockImage::new()),
        video: Arc::new(MockVideo::new()),
    }
}
