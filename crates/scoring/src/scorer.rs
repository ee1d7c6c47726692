//! Scoring pipeline
//!
//! Attempts the model path, recovering with the deterministic fallback when
//! the model's output fails validation. No retries are made against the
//! model; a call failure surfaces as unavailable.

use std::sync::Arc;
use std::time::Duration;

use lingua_tutor_core::{Error, LanguageModel, PronunciationFeedback, Result, UtterancePair};

use crate::fallback::score_fallback;
use crate::model::{ModelScorer, ModelScorerConfig};

/// Scoring pipeline configuration
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    /// Bound on the model call; expiry is treated as unavailable
    pub model_timeout: Duration,
    /// Sampling temperature for the assessment prompt
    pub temperature: f32,
    /// Token budget for the assessment response
    pub max_tokens: u32,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            model_timeout: Duration::from_secs(20),
            temperature: 0.2,
            max_tokens: 512,
        }
    }
}

/// The pronunciation scoring pipeline
pub struct PronunciationScorer {
    model: Option<ModelScorer>,
    config: ScorerConfig,
}

impl PronunciationScorer {
    /// Create a scorer
    ///
    /// Without a model backend every score comes from the deterministic
    /// path; this keeps development setups working with a warning.
    pub fn new(llm: Option<Arc<dyn LanguageModel>>, config: ScorerConfig) -> Self {
        let model = match llm {
            Some(llm) => Some(ModelScorer::new(
                llm,
                ModelScorerConfig {
                    temperature: config.temperature,
                    max_tokens: config.max_tokens,
                },
            )),
            None => {
                tracing::warn!("no model backend configured, scoring deterministically");
                None
            }
        };

        Self { model, config }
    }

    /// Create a scorer that never calls a model
    pub fn deterministic() -> Self {
        Self {
            model: None,
            config: ScorerConfig::default(),
        }
    }

    /// Whether a model backend is attached
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Score an utterance pair
    ///
    /// Returns `Error::Input` for empty submissions and `Error::Unavailable`
    /// when the model call itself fails. Malformed model output never
    /// escapes: the deterministic fallback covers it.
    pub async fn score(&self, pair: &UtterancePair) -> Result<PronunciationFeedback> {
        pair.validate()?;

        let Some(model) = &self.model else {
            metrics::counter!("lingua_tutor_scored_total", "path" => "fallback").increment(1);
            return Ok(score_fallback(pair));
        };

        let outcome = tokio::time::timeout(self.config.model_timeout, model.assess(pair)).await;

        match outcome {
            Err(_elapsed) => {
                metrics::counter!("lingua_tutor_scoring_unavailable_total").increment(1);
                Err(Error::unavailable(format!(
                    "model call exceeded {}s",
                    self.config.model_timeout.as_secs()
                )))
            }
            Ok(Ok(feedback)) => {
                metrics::counter!("lingua_tutor_scored_total", "path" => "model").increment(1);
                Ok(feedback)
            }
            Ok(Err(Error::MalformedOutput(reason))) => {
                tracing::warn!(%reason, "model output failed validation, using fallback scorer");
                metrics::counter!("lingua_tutor_scored_total", "path" => "fallback").increment(1);
                Ok(score_fallback(pair))
            }
            Ok(Err(e)) => {
                metrics::counter!("lingua_tutor_scoring_unavailable_total").increment(1);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lingua_tutor_core::{GenerateRequest, GenerateResponse, Language};

    // Minimal scripted backend for exercising each pipeline branch.
    struct CannedModel {
        response: Result<String>,
    }

    impl CannedModel {
        fn ok(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
            }
        }

        fn unavailable(msg: &str) -> Self {
            Self {
                response: Err(Error::unavailable(msg)),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn generate(&self, _request: GenerateRequest) -> Result<GenerateResponse> {
            match &self.response {
                Ok(text) => Ok(GenerateResponse {
                    text: text.clone(),
                    model: None,
                }),
                Err(Error::Unavailable(msg)) => Err(Error::unavailable(msg.clone())),
                Err(_) => unreachable!(),
            }
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn scorer_with(model: CannedModel) -> PronunciationScorer {
        PronunciationScorer::new(Some(Arc::new(model)), ScorerConfig::default())
    }

    fn pair() -> UtterancePair {
        UtterancePair::new("Hello there friend", "hello there friend", Language::English)
    }

    #[tokio::test]
    async fn test_valid_model_output_passes_through() {
        let json = r#"{
            "overallScore": 91,
            "wordScores": [
                {"word": "Hello", "score": 95, "correct": true},
                {"word": "there", "score": 92, "correct": true},
                {"word": "friend", "score": 85, "correct": false, "suggestion": "slow down"}
            ],
            "feedback": "Well done.",
            "strengths": ["Pace"],
            "improvements": ["Final consonants"]
        }"#;
        let scorer = scorer_with(CannedModel::ok(json));

        let feedback = scorer.score(&pair()).await.unwrap();
        assert_eq!(feedback.overall_score, 91);
        assert_eq!(feedback.feedback, "Well done.");
    }

    #[tokio::test]
    async fn test_malformed_output_falls_back() {
        let scorer = scorer_with(CannedModel::ok("Sorry, I can't help with that."));

        let feedback = scorer.score(&pair()).await.unwrap();
        // Fallback fingerprint: fixed feedback string and a 95 overall for a match
        assert_eq!(
            feedback.feedback,
            "Good effort! Keep practicing to improve your pronunciation."
        );
        assert_eq!(feedback.overall_score, 95);
        assert_eq!(feedback.word_scores.len(), 3);
    }

    #[tokio::test]
    async fn test_call_failure_is_not_masked() {
        let scorer = scorer_with(CannedModel::unavailable("connection refused"));

        let err = scorer.score(&pair()).await.unwrap_err();
        assert!(matches!(err, Error::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_input_rejected_before_model() {
        let scorer = scorer_with(CannedModel::unavailable("must not be reached"));
        let bad = UtterancePair::new("", "hello", Language::English);

        let err = scorer.score(&bad).await.unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[tokio::test]
    async fn test_no_backend_scores_deterministically() {
        let scorer = PronunciationScorer::deterministic();
        assert!(!scorer.has_model());

        let feedback = scorer.score(&pair()).await.unwrap();
        assert_eq!(feedback.overall_score, 95);
    }

    #[tokio::test]
    async fn test_word_count_always_matches_expected() {
        // Property: whatever path produced it, wordScores length equals the
        // expected token count.
        let scorer = PronunciationScorer::deterministic();
        for (expected, transcribed) in [
            ("uno", "uno dos tres"),
            ("uno dos tres cuatro", "uno"),
            ("a b c d e f", "a b c d e f"),
        ] {
            let p = UtterancePair::new(expected, transcribed, Language::Spanish);
            let feedback = scorer.score(&p).await.unwrap();
            assert_eq!(feedback.word_scores.len(), p.expected_token_count());
            assert!(feedback.word_scores.iter().all(|w| w.score <= 100));
            assert!(feedback.overall_score <= 100);
        }
    }
}
