//! Pronunciation feedback types

use serde::{Deserialize, Serialize};

/// Per-token scoring result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordScore {
    /// The reference-language token, original casing preserved
    pub word: String,

    /// Score in [0, 100]
    pub score: u8,

    /// Whether the word passed the scorer's correctness threshold
    pub correct: bool,

    /// Present only when the word was not correct
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl WordScore {
    /// A correct word at the given score; no suggestion is carried
    pub fn correct(word: impl Into<String>, score: u8) -> Self {
        Self {
            word: word.into(),
            score: clamp_score(score as i64),
            correct: true,
            suggestion: None,
        }
    }

    /// An incorrect word with a suggestion
    pub fn incorrect(word: impl Into<String>, score: u8, suggestion: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            score: clamp_score(score as i64),
            correct: false,
            suggestion: Some(suggestion.into()),
        }
    }
}

/// The result object, returned unconditionally by the scoring pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationFeedback {
    /// Holistic score in [0, 100]
    pub overall_score: u8,

    /// One entry per whitespace token of the expected text, in order
    pub word_scores: Vec<WordScore>,

    /// 1-3 sentences of human-readable feedback
    pub feedback: String,

    /// What the learner did well
    pub strengths: Vec<String>,

    /// What the learner should work on
    pub improvements: Vec<String>,
}

impl PronunciationFeedback {
    /// Rounded arithmetic mean of the word scores
    ///
    /// Returns 0 for an empty word list; callers uphold the non-empty
    /// invariant before this matters.
    pub fn mean_word_score(&self) -> u8 {
        if self.word_scores.is_empty() {
            return 0;
        }
        let sum: u32 = self.word_scores.iter().map(|w| w.score as u32).sum();
        ((sum as f64) / (self.word_scores.len() as f64)).round() as u8
    }

    /// Count of words the scorer marked correct
    pub fn correct_count(&self) -> usize {
        self.word_scores.iter().filter(|w| w.correct).count()
    }
}

/// Clamp an ingested score to [0, 100]
///
/// Out-of-range model output is clamped, not rejected.
pub fn clamp_score(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-5), 0);
        assert_eq!(clamp_score(0), 0);
        assert_eq!(clamp_score(87), 87);
        assert_eq!(clamp_score(250), 100);
    }

    #[test]
    fn test_mean_word_score_rounds() {
        let feedback = PronunciationFeedback {
            overall_score: 0,
            word_scores: vec![
                WordScore::correct("Hello", 95),
                WordScore::correct("there", 95),
                WordScore::incorrect("friend", 70, "try again"),
            ],
            feedback: String::new(),
            strengths: vec![],
            improvements: vec![],
        };
        // (95 + 95 + 70) / 3 = 86.67 -> 87
        assert_eq!(feedback.mean_word_score(), 87);
    }

    #[test]
    fn test_suggestion_omitted_when_correct() {
        let word = WordScore::correct("bien", 95);
        let json = serde_json::to_value(&word).unwrap();
        assert!(json.get("suggestion").is_none());

        let word = WordScore::incorrect("bien", 70, "slow down");
        let json = serde_json::to_value(&word).unwrap();
        assert_eq!(json["suggestion"], "slow down");
    }
}
