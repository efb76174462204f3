//! Collaborators backed by configured external programs.
//!
//! Text goes to the program on stdin; the artifact reference or generated
//! text comes back on stdout.

use crate::collaborators::base::{
    ExtractedSlide, Extractor, ImageRenderer, Narrator, QuizGenerator, SpeechSynthesizer,
    VideoAssembler,
};
use crate::collaborators::executor::{CommandExecutor, Placeholders};
use crate::error::StageError;
use async_trait::async_trait;
use sc_protocol::config_models::CommandSpec;
use std::path::Path;

/// Runs an extraction program that prints `[{slide_number, text}]` as JSON.
pub struct CommandExtractor {
    spec: CommandSpec,
}

impl CommandExtractor {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl Extractor for CommandExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<ExtractedSlide>, StageError> {
        let path = path.to_string_lossy();
        let placeholders = Placeholders {
            path: Some(&path),
            ..Placeholders::default()
        };
        let output = CommandExecutor::run(&self.spec, &placeholders, None, StageError::Parse).await?;

        serde_json::from_str(&output)
            .map_err(|e| StageError::Parse(format!("invalid slide list from extractor: {e}")))
    }
}

/// Generates narration from slide text.
pub struct CommandNarrator {
    spec: CommandSpec,
}

impl CommandNarrator {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl Narrator for CommandNarrator {
    async fn narrate(&self, text: &str, language: &str) -> Result<String, StageError> {
        let placeholders = Placeholders {
            language: Some(language),
            ..Placeholders::default()
        };
        let narration =
            CommandExecutor::run(&self.spec, &placeholders, Some(text), StageError::Generation)
                .await?;

        if narration.is_empty() {
            return Err(StageError::Generation("narration is empty".to_string()));
        }
        Ok(narration)
    }
}

pub struct CommandQuizGenerator {
    spec: CommandSpec,
}

impl CommandQuizGenerator {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl QuizGenerator for CommandQuizGenerator {
    async fn generate_quiz(&self, text: &str, language: &str) -> Result<String, StageError> {
        let placeholders = Placeholders {
            language: Some(language),
            ..Placeholders::default()
        };
        CommandExecutor::run(&self.spec, &placeholders, Some(text), StageError::Generation).await
    }
}

pub struct CommandSpeech {
    spec: CommandSpec,
}

impl CommandSpeech {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSpeech {
    async fn synthesize(&self, text: &str, language: &str) -> Result<String, StageError> {
        if text.trim().is_empty() {
            return Err(StageError::Synthesis("no text to synthesize".to_string()));
        }
        let placeholders = Placeholders {
            language: Some(language),
            ..Placeholders::default()
        };
        CommandExecutor::run(&self.spec, &placeholders, Some(text), StageError::Synthesis).await
    }
}

pub struct CommandImage {
    spec: CommandSpec,
}

impl CommandImage {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

#[async_trait]
impl ImageRenderer for CommandImage {
    async fn render(&self, text: &str) -> Result<String, StageError> {
        CommandExecutor::run(&self.spec, &Placeholders::default(), Some(text), StageError::Render)
            .await
    }
}

/// Assembles with one program and stitches with another.
pub struct CommandVideo {
    assemble: CommandSpec,
    stitch: CommandSpec,
}

impl CommandVideo {
    pub fn new(assemble: CommandSpec, stitch: CommandSpec) -> Self {
        Self { assemble, stitch }
    }
}

#[async_trait]
impl VideoAssembler for CommandVideo {
    async fn assemble(&self, image: &str, audio: &str) -> Result<String, StageError> {
        let placeholders = Placeholders {
            image: Some(image),
            audio: Some(audio),
            ..Placeholders::default()
        };
        CommandExecutor::run(&self.assemble, &placeholders, None, StageError::Assembly).await
    }

    async fn stitch(&self, videos: &[String]) -> Result<String, StageError> {
        match videos {
            [] => Err(StageError::Stitch("no videos to stitch".to_string())),
            [single] => Ok(single.clone()),
            _ => {
                let placeholders = Placeholders {
                    inputs: videos,
                    ..Placeholders::default()
                };
                CommandExecutor::run(&self.stitch, &placeholders, None, StageError::Stitch).await
            }
        }
    }
}
