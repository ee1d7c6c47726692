//! Model-backed pronunciation scorer
//!
//! Prompts a language model with a fixed assessment template and validates
//! its JSON output into a [`PronunciationFeedback`]. Validation failures are
//! reported as [`Error::MalformedOutput`] so the pipeline can recover with
//! the deterministic fallback; call failures pass through untouched.

use std::sync::Arc;

use serde::Deserialize;

use lingua_tutor_core::feedback::clamp_score;
use lingua_tutor_core::{
    Error, GenerateRequest, LanguageModel, Message, PronunciationFeedback, Result, UtterancePair,
    WordScore,
};

use crate::normalize::tokenize;

/// A per-word score at or above this is considered correct when the model
/// omits the flag
const WORD_CORRECT_THRESHOLD: u8 = 90;

/// Model scorer configuration
#[derive(Debug, Clone)]
pub struct ModelScorerConfig {
    /// Sampling temperature
    pub temperature: f32,
    /// Token budget for the assessment response
    pub max_tokens: u32,
}

impl Default for ModelScorerConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 512,
        }
    }
}

/// Scores utterances by prompting a language model
pub struct ModelScorer {
    llm: Arc<dyn LanguageModel>,
    config: ModelScorerConfig,
}

impl ModelScorer {
    /// Create a new model scorer
    pub fn new(llm: Arc<dyn LanguageModel>, config: ModelScorerConfig) -> Self {
        Self { llm, config }
    }

    /// Assess a pair via the model
    ///
    /// Errors are either `Unavailable` (the call itself failed) or
    /// `MalformedOutput` (the response failed validation).
    pub async fn assess(&self, pair: &UtterancePair) -> Result<PronunciationFeedback> {
        let request = GenerateRequest {
            messages: vec![
                Message::system(self.system_prompt(pair)),
                Message::user(self.assessment_prompt(pair)),
            ],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            json_output: true,
        };

        let response = self.llm.generate(request).await?;

        tracing::debug!(
            backend = self.llm.name(),
            chars = response.text.len(),
            "model assessment received"
        );

        parse_feedback(&response.text, &pair.expected_text)
    }

    fn system_prompt(&self, pair: &UtterancePair) -> String {
        format!(
            "You are a pronunciation coach for {language} learners. You compare what a \
             learner was supposed to say with what speech recognition heard, and you \
             respond with constructive, encouraging feedback as a single JSON object.",
            language = pair.language.display_name(),
        )
    }

    fn assessment_prompt(&self, pair: &UtterancePair) -> String {
        let token_count = pair.expected_token_count();
        format!(
            r#"Expected sentence: "{expected}"
What the learner said (per speech recognition): "{transcribed}"

Assess the learner's pronunciation. Respond with ONLY a JSON object in this shape:

{{
  "overallScore": <integer 0-100>,
  "wordScores": [
    {{"word": "<word from the expected sentence>", "score": <integer 0-100>, "correct": <bool>, "suggestion": "<omit when correct>"}}
  ],
  "feedback": "<1-3 encouraging sentences>",
  "strengths": ["<string>"],
  "improvements": ["<string>"]
}}

"wordScores" must contain exactly {token_count} entries, one per word of the
expected sentence, in order. Do not add any text outside the JSON object."#,
            expected = pair.expected_text,
            transcribed = pair.transcribed_text,
            token_count = token_count,
        )
    }
}

/// Raw model output, everything optional so validation can pinpoint gaps
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFeedback {
    overall_score: Option<i64>,
    word_scores: Option<Vec<RawWordScore>>,
    feedback: Option<String>,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    improvements: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawWordScore {
    score: Option<i64>,
    correct: Option<bool>,
    suggestion: Option<String>,
}

/// Parse and validate a model response against the expected sentence
///
/// Required fields: `overallScore`, a non-empty `wordScores` matching the
/// expected token count, and `feedback`. Scores outside [0, 100] are
/// clamped, not rejected.
pub fn parse_feedback(raw_text: &str, expected_text: &str) -> Result<PronunciationFeedback> {
    let json = extract_json_object(raw_text)
        .ok_or_else(|| Error::malformed("no JSON object in model response"))?;

    let raw: RawFeedback = serde_json::from_str(json)
        .map_err(|e| Error::malformed(format!("response is not valid JSON: {}", e)))?;

    let overall = raw
        .overall_score
        .ok_or_else(|| Error::malformed("missing overallScore"))?;

    let raw_words = raw
        .word_scores
        .ok_or_else(|| Error::malformed("missing wordScores"))?;
    if raw_words.is_empty() {
        return Err(Error::malformed("wordScores is empty"));
    }

    let feedback_text = match raw.feedback {
        Some(ref text) if !text.trim().is_empty() => text.clone(),
        _ => return Err(Error::malformed("missing feedback text")),
    };

    let expected_tokens = tokenize(expected_text);
    if raw_words.len() != expected_tokens.len() {
        return Err(Error::malformed(format!(
            "wordScores has {} entries for {} expected words",
            raw_words.len(),
            expected_tokens.len()
        )));
    }

    let word_scores = expected_tokens
        .iter()
        .zip(raw_words)
        .map(|(token, raw_word)| {
            let score = raw_word
                .score
                .ok_or_else(|| Error::malformed(format!("missing score for word \"{}\"", token)))?;
            let score = clamp_score(score);
            let correct = raw_word.correct.unwrap_or(score >= WORD_CORRECT_THRESHOLD);

            // The word field always carries the reference token; a suggestion
            // only survives on an incorrect word.
            Ok(WordScore {
                word: (*token).to_string(),
                score,
                correct,
                suggestion: if correct { None } else { raw_word.suggestion },
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PronunciationFeedback {
        overall_score: clamp_score(overall),
        word_scores,
        feedback: feedback_text,
        strengths: raw.strengths,
        improvements: raw.improvements,
    })
}

/// Extract the outermost JSON object from model text
///
/// Models occasionally wrap output in prose or markdown fences even when a
/// JSON response was requested.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED: &str = "Hello there friend";

    fn valid_json() -> String {
        r#"{
            "overallScore": 88,
            "wordScores": [
                {"word": "Hello", "score": 95, "correct": true},
                {"word": "there", "score": 90, "correct": true},
                {"word": "friend", "score": 72, "correct": false, "suggestion": "Stress the first syllable"}
            ],
            "feedback": "Nice work overall.",
            "strengths": ["Good rhythm"],
            "improvements": ["Work on 'friend'"]
        }"#
        .to_string()
    }

    #[test]
    fn test_parse_valid_response() {
        let feedback = parse_feedback(&valid_json(), EXPECTED).unwrap();
        assert_eq!(feedback.overall_score, 88);
        assert_eq!(feedback.word_scores.len(), 3);
        assert_eq!(feedback.word_scores[2].suggestion.as_deref(), Some("Stress the first syllable"));
    }

    #[test]
    fn test_parse_json_wrapped_in_prose() {
        let wrapped = format!("Here is the assessment:\n```json\n{}\n```", valid_json());
        let feedback = parse_feedback(&wrapped, EXPECTED).unwrap();
        assert_eq!(feedback.overall_score, 88);
    }

    #[test]
    fn test_scores_clamped_not_rejected() {
        let json = r#"{
            "overallScore": 140,
            "wordScores": [
                {"word": "Hello", "score": -10, "correct": false},
                {"word": "there", "score": 250, "correct": true},
                {"word": "friend", "score": 80, "correct": true}
            ],
            "feedback": "ok"
        }"#;
        let feedback = parse_feedback(json, EXPECTED).unwrap();
        assert_eq!(feedback.overall_score, 100);
        assert_eq!(feedback.word_scores[0].score, 0);
        assert_eq!(feedback.word_scores[1].score, 100);
    }

    #[test]
    fn test_missing_required_fields_is_malformed() {
        let no_overall = r#"{"wordScores": [{"word": "a", "score": 1}], "feedback": "x"}"#;
        assert!(matches!(
            parse_feedback(no_overall, "a"),
            Err(Error::MalformedOutput(_))
        ));

        let no_words = r#"{"overallScore": 50, "feedback": "x"}"#;
        assert!(matches!(
            parse_feedback(no_words, "a"),
            Err(Error::MalformedOutput(_))
        ));

        let empty_words = r#"{"overallScore": 50, "wordScores": [], "feedback": "x"}"#;
        assert!(matches!(
            parse_feedback(empty_words, "a"),
            Err(Error::MalformedOutput(_))
        ));

        let no_feedback = r#"{"overallScore": 50, "wordScores": [{"score": 1}]}"#;
        assert!(matches!(
            parse_feedback(no_feedback, "a"),
            Err(Error::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_word_count_mismatch_is_malformed() {
        let json = r#"{
            "overallScore": 80,
            "wordScores": [{"word": "Hello", "score": 95, "correct": true}],
            "feedback": "ok"
        }"#;
        assert!(matches!(
            parse_feedback(json, EXPECTED),
            Err(Error::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_not_json_at_all_is_malformed() {
        assert!(matches!(
            parse_feedback("I cannot assess this.", EXPECTED),
            Err(Error::MalformedOutput(_))
        ));
    }

    #[test]
    fn test_correct_derived_from_score_when_omitted() {
        let json = r#"{
            "overallScore": 85,
            "wordScores": [
                {"word": "Hello", "score": 95},
                {"word": "there", "score": 89},
                {"word": "friend", "score": 90}
            ],
            "feedback": "ok"
        }"#;
        let feedback = parse_feedback(json, EXPECTED).unwrap();
        assert!(feedback.word_scores[0].correct);
        assert!(!feedback.word_scores[1].correct);
        assert!(feedback.word_scores[2].correct);
    }

    #[test]
    fn test_suggestion_dropped_on_correct_word() {
        let json = r#"{
            "overallScore": 95,
            "wordScores": [
                {"word": "Hello", "score": 95, "correct": true, "suggestion": "noise"},
                {"word": "there", "score": 95, "correct": true},
                {"word": "friend", "score": 95, "correct": true}
            ],
            "feedback": "ok"
        }"#;
        let feedback = parse_feedback(json, EXPECTED).unwrap();
        assert!(feedback.word_scores[0].suggestion.is_none());
    }
}
