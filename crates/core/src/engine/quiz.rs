//! Quiz stage: generate, validate, retry once, then give up with an empty set.

use crate::collaborators::base::{QuizGenerator, QuizValidator};
use crate::error::StageError;
use sc_protocol::result_models::QuizSet;

const ATTEMPTS: usize = 2;

/// Produce a validated quiz for one slide.
///
/// An attempt fails validation when the output cannot be parsed, yields no
/// questions or is not written in `language`. After two failed attempts an
/// empty set is returned instead of an error.
///
/// # Errors
///
/// Only errors from the generator itself (connection, model failure) are
/// returned.
pub async fn generate_validated_quiz(
    generator: &dyn QuizGenerator,
    validator: &dyn QuizValidator,
    text: &str,
    language: &str,
) -> Result<QuizSet, StageError> {
    for attempt in 1..=ATTEMPTS {
        let raw = generator.generate_quiz(text, language).await?;

        let rejection = match validator.validate(&raw) {
            Ok(quiz) if quiz.is_empty() => "no valid questions".to_string(),
            Ok(quiz) if !validator.check_language(&quiz, language) => {
                format!("questions are not in {language}")
            }
            Ok(quiz) => return Ok(quiz),
            Err(e) => e.to_string(),
        };

        tracing::warn!(attempt, reason = %rejection, "Quiz validation failed");
    }

    tracing::warn!("Quiz validation failed after retry, using empty quiz");
    Ok(QuizSet::empty())
}
