//! External collaborators invoked by the pipeline.
//!
//! This module provides one trait per external operation (extraction,
//! narration, quiz generation and validation, speech, image, video), the
//! adapters implementing them and the factory that wires them from
//! configuration.

pub mod adapters;
pub mod base;
pub mod executor;
pub mod factory;
pub mod validator;

pub use adapters::JsonDeckExtractor;
pub use base::{
    Collaborators, ExtractedSlide, Extractor, ImageRenderer, Narrator, QuizGenerator,
    QuizValidator, SpeechSynthesizer, VideoAssembler,
};
pub use factory::CollaboratorFactory;
pub use validator::JsonQuizValidator;
