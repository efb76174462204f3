//! Collaborator adapter implementations.

mod command;
mod json_deck;
pub mod mock;

pub use command::{
    CommandExtractor, CommandImage, CommandNarrator, CommandQuizGenerator, CommandSpeech,
    CommandVideo,
};
pub use json_deck::JsonDeckExtractor;
pub use mock::{
    mock_collaborators, MockExtractor, MockImage, MockNarrator, MockQuizGenerator, MockSpeech,
    MockVideo,
};
