//! Quiz validation for JSON quiz output.

use crate::collaborators::base::QuizValidator;
use crate::error::StageError;
use sc_protocol::result_models::{Difficulty, QuizQuestion, QuizSet};
use serde_json::Value;
use whatlang::{Detector, Lang};

const OPTIONS_PER_QUESTION: usize = 4;

/// Validates quiz output shaped as `{"questions": [...]}`.
///
/// Repairs instead of rejecting where it can:
/// - questions without text or without exactly four options are dropped
/// - an unknown difficulty becomes `easy`
/// - an answer that is not one of the options becomes the first option
///
/// The language check runs a detector over each question and its options,
/// choosing between `en`, `fr` and `hi`. Other languages always pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonQuizValidator;

impl JsonQuizValidator {
    pub fn new() -> Self {
        Self
    }

    fn parse_question(value: &Value) -> Option<QuizQuestion> {
        let question = value.get("question")?.as_str()?.trim();
        if question.is_empty() {
            return None;
        }

        let options: Vec<String> = value
            .get("options")?
            .as_array()?
            .iter()
            .map(|option| option.as_str().map(str::to_string))
            .collect::<Option<_>>()?;
        if options.len() != OPTIONS_PER_QUESTION {
            return None;
        }

        let answer = value
            .get("answer")
            .and_then(Value::as_str)
            .filter(|answer| options.iter().any(|option| option == answer))
            .map(str::to_string)
            .unwrap_or_else(|| options[0].clone());

        let difficulty = match value.get("difficulty").and_then(Value::as_str) {
            Some("medium") => Difficulty::Medium,
            Some("hard") => Difficulty::Hard,
            _ => Difficulty::Easy,
        };

        Some(QuizQuestion {
            question: question.to_string(),
            options,
            answer,
            difficulty,
        })
    }
}

impl QuizValidator for JsonQuizValidator {
    fn validate(&self, raw: &str) -> Result<QuizSet, StageError> {
        let data: Value = serde_json::from_str(raw.trim())
            .map_err(|e| StageError::Validation(format!("quiz output is not JSON: {e}")))?;

        let questions = data
            .get("questions")
            .and_then(Value::as_array)
            .map(|questions| questions.iter().filter_map(Self::parse_question).collect())
            .unwrap_or_default();

        Ok(QuizSet { questions })
    }

    fn check_language(&self, quiz: &QuizSet, language: &str) -> bool {
        let Some(expected) = lang_for(language) else {
            return true;
        };

        // Options alone are too short to classify.
        quiz.questions.iter().all(|q| {
            let text = std::iter::once(q.question.as_str())
                .chain(q.options.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join("\n");
            is_written_in(&text, expected)
        })
    }
}

/// Languages the detector chooses between, by configured code.
const LANGUAGES: [(&str, Lang); 3] = [("en", Lang::Eng), ("fr", Lang::Fra), ("hi", Lang::Hin)];

fn lang_for(language: &str) -> Option<Lang> {
    LANGUAGES
        .iter()
        .find(|(code, _)| *code == language)
        .map(|(_, lang)| *lang)
}

/// Whether `text` is detected as `expected`.
///
/// Text without letters passes. Text the detector cannot classify fails.
fn is_written_in(text: &str, expected: Lang) -> bool {
    if !text.chars().any(char::is_alphabetic) {
        return true;
    }

    let detector = Detector::with_allowlist(LANGUAGES.iter().map(|(_, lang)| *lang).collect());
    detector.detect_lang(text) == Some(expected)
}
