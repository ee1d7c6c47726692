//! Utterance pairs submitted for scoring

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::language::Language;

/// The unit of work for pronunciation scoring
///
/// Pairs the reference sentence the learner was supposed to produce with
/// what speech recognition heard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtterancePair {
    /// Reference sentence the learner was supposed to produce
    pub expected_text: String,

    /// What speech recognition heard
    pub transcribed_text: String,

    /// Language being practiced
    pub language: Language,
}

impl UtterancePair {
    /// Create a new utterance pair
    pub fn new(
        expected_text: impl Into<String>,
        transcribed_text: impl Into<String>,
        language: Language,
    ) -> Self {
        Self {
            expected_text: expected_text.into(),
            transcribed_text: transcribed_text.into(),
            language,
        }
    }

    /// Reject empty submissions before they reach a scorer
    ///
    /// Both text fields must contain at least one non-whitespace character.
    pub fn validate(&self) -> Result<()> {
        if self.expected_text.trim().is_empty() {
            return Err(Error::input("expected text is empty"));
        }
        if self.transcribed_text.trim().is_empty() {
            return Err(Error::input("transcribed text is empty"));
        }
        Ok(())
    }

    /// Number of whitespace-separated tokens in the expected text
    pub fn expected_token_count(&self) -> usize {
        self.expected_text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty() {
        let pair = UtterancePair::new("", "hello", Language::English);
        assert!(matches!(pair.validate(), Err(Error::Input(_))));

        let pair = UtterancePair::new("hello", "   ", Language::English);
        assert!(matches!(pair.validate(), Err(Error::Input(_))));
    }

    #[test]
    fn test_validate_accepts_non_empty() {
        let pair = UtterancePair::new("Hola amigo", "hola amigo", Language::Spanish);
        assert!(pair.validate().is_ok());
        assert_eq!(pair.expected_token_count(), 2);
    }

    #[test]
    fn test_wire_field_names() {
        let pair = UtterancePair::new("a", "b", Language::English);
        let json = serde_json::to_value(&pair).unwrap();
        assert!(json.get("expectedText").is_some());
        assert!(json.get("transcribedText").is_some());
        assert!(json.get("language").is_some());
    }
}
