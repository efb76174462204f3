//! Collaborator factory for building a pipeline's collaborators from configuration.

use crate::collaborators::adapters::{
    CommandExtractor, CommandImage, CommandNarrator, CommandQuizGenerator, CommandSpeech,
    CommandVideo, JsonDeckExtractor,
};
use crate::collaborators::base::{
    Collaborators, Extractor, ImageRenderer, Narrator, QuizGenerator, SpeechSynthesizer,
    VideoAssembler,
};
use crate::collaborators::executor::CommandExecutor;
use crate::collaborators::validator::JsonQuizValidator;
use crate::error::StageError;
use async_trait::async_trait;
use sc_protocol::config_models::{CommandConfig, CommandSpec};
use std::sync::Arc;

/// Availability of one configured collaborator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStatus {
    pub stage: &'static str,
    /// Configured program, if any.
    pub program: Option<String>,
    pub available: bool,
}

/// Factory for collaborator bundles.
pub struct CollaboratorFactory;

impl CollaboratorFactory {
    /// Build collaborators from the `[commands]` table.
    ///
    /// # Behavior
    ///
    /// - `extract` missing: decks are read as JSON with `JsonDeckExtractor`
    /// - any other command missing: the stage fails with
    ///   `StageError::Unavailable` when it runs, which the pipeline records
    ///   on the affected slide
    /// - quiz output is always checked by `JsonQuizValidator`
    pub fn from_config(commands: &CommandConfig) -> Collaborators {
        let extractor: Arc<dyn Extractor> = match &commands.extract {
            Some(spec) => Arc::new(CommandExtractor::new(spec.clone())),
            None => Arc::new(JsonDeckExtractor::new()),
        };

        let narrator: Arc<dyn Narrator> = match &commands.narrate {
            Some(spec) => Arc::new(CommandNarrator::new(spec.clone())),
            None => Arc::new(Unconfigured("narrate")),
        };

        let quiz_generator: Arc<dyn QuizGenerator> = match &commands.quiz {
            Some(spec) => Arc::new(CommandQuizGenerator::new(spec.clone())),
            None => Arc::new(Unconfigured("quiz")),
        };

        let speech: Arc<dyn SpeechSynthesizer> = match &commands.speech {
            Some(spec) => Arc::new(CommandSpeech::new(spec.clone())),
            None => Arc::new(Unconfigured("speech")),
        };

        let image: Arc<dyn ImageRenderer> = match &commands.image {
            Some(spec) => Arc::new(CommandImage::new(spec.clone())),
            None => Arc::new(Unconfigured("image")),
        };

        let video: Arc<dyn VideoAssembler> = match (&commands.assemble, &commands.stitch) {
            (Some(assemble), Some(stitch)) => {
                Arc::new(CommandVideo::new(assemble.clone(), stitch.clone()))
            }
            (None, _) => Arc::new(Unconfigured("assemble")),
            (_, None) => Arc::new(Unconfigured("stitch")),
        };

        Collaborators {
            extractor,
            narrator,
            quiz_generator,
            quiz_validator: Arc::new(JsonQuizValidator::new()),
            speech,
            image,
            video,
        }
    }

    /// Report which configured programs can be found.
    pub fn check_availability(commands: &CommandConfig) -> Vec<CommandStatus> {
        let entries: [(&'static str, &Option<CommandSpec>); 7] = [
            ("extract", &commands.extract),
            ("narrate", &commands.narrate),
            ("quiz", &commands.quiz),
            ("speech", &commands.speech),
            ("image", &commands.image),
            ("assemble", &commands.assemble),
            ("stitch", &commands.stitch),
        ];

        entries
            .into_iter()
            .map(|(stage, spec)| CommandStatus {
                stage,
                program: spec.as_ref().map(|spec| spec.program.clone()),
                available: spec
                    .as_ref()
                    .is_some_and(|spec| CommandExecutor::is_available(&spec.program)),
            })
            .collect()
    }
}

/// Stand-in for a stage without a configured command.
struct Unconfigured(&'static str);

impl Unconfigured {
    fn error(&self) -> StageError {
        StageError::Unavailable(format!("no command configured for '{}'", self.0))
    }
}

#[async_trait]
impl Narrator for Unconfigured {
    async fn narrate(&self, _text: &str, _language: &str) -> Result<String, StageError> {
        Err(self.error())
    }
}

#[async_trait]
impl QuizGenerator for Unconfigured {
    async fn generate_quiz(&self, _text: &str, _language: &str) -> Result<String, StageError> {
        Err(self.error())
    }
}

#[async_trait]
impl SpeechSynthesizer for Unconfigured {
    async fn synthesize(&self, _text: &str, _language: &str) -> Result<String, StageError> {
        Err(self.error())
    }
}

#[async_trait]
impl ImageRenderer for Unconfigured {
    async fn render(&self, _text: &str) -> Result<String, StageError> {
        Err(self.error())
    }
}

#[async_trait]
impl VideoAssembler for Unconfigured {
    async fn assemble(&self, _image: &str, _audio: &str) -> Result<String, StageError> {
        Err(self.error())
    }

    async fn stitch(&self, _videos: &[String]) -> Result<String, StageError> {
        Err(self.error())
    }
}
