//! Extractor for decks that were already converted to JSON.

use crate::collaborators::base::{ExtractedSlide, Extractor};
use crate::error::StageError;
use async_trait::async_trait;
use std::path::Path;

/// Reads a JSON file shaped as `[{"slide_number": 1, "text": "..."}]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDeckExtractor;

impl JsonDeckExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Extractor for JsonDeckExtractor {
    async fn extract(&self, path: &Path) -> Result<Vec<ExtractedSlide>, StageError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StageError::Parse(format!("failed to read {}: {}", path.display(), e)))?;

        serde_json::from_str(&content)
            .map_err(|e| StageError::Parse(format!("invalid deck {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_extract_from_json_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let deck = dir.path().join("deck.json");
        fs::write(
            &deck,
            r#"[{"slide_number": 1, "text": "Intro"}, {"slide_number": 3, "text": ""}]"#,
        )
        .expect("Failed to write deck");

        let slides = JsonDeckExtractor::new().extract(&deck).await.unwrap();

        assert_eq!(slides.len(), 2);
        assert_eq!(slides[1].slide_number, 3);
        assert!(!slides[1].has_text());
    }

    #[tokio::test]
    async fn test_missing_or_malformed_deck_is_parse_error() {
        let dir = tempdir().expect("Failed to create temp dir");
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            JsonDeckExtractor::new().extract(&missing).await,
            Err(StageError::Parse(_))
        ));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not a deck").expect("Failed to write deck");
        assert!(matches!(
            JsonDeckExtractor::new().extract(&broken).await,
            Err(StageError::Parse(_))
        ));
    }
}
