//! Deterministic fallback scorer
//!
//! Guarantees a well-formed feedback object from local string comparison
//! alone. The comparison is positional (index-aligned): insertions or
//! deletions in the transcription shift every later word. That limitation is
//! accepted; the fallback's only job is to never let the pipeline return an
//! error to the learner once an utterance pair was formed.

use lingua_tutor_core::{PronunciationFeedback, UtterancePair, WordScore};

use crate::normalize::{normalize, tokenize};

/// Score for a token that matched after normalization
const MATCH_SCORE: u8 = 95;

/// Score for a missing or mismatched token
const MISS_SCORE: u8 = 70;

/// Score a pair without any network call
///
/// Each expected token is compared against the transcribed token at the same
/// index. The overall score is the rounded mean of the word scores.
pub fn score_fallback(pair: &UtterancePair) -> PronunciationFeedback {
    let expected = tokenize(&pair.expected_text);
    let transcribed = tokenize(&pair.transcribed_text);

    let word_scores: Vec<WordScore> = expected
        .iter()
        .enumerate()
        .map(|(i, original)| {
            let matched = transcribed
                .get(i)
                .is_some_and(|t| normalize(t) == normalize(original));

            if matched {
                WordScore::correct(*original, MATCH_SCORE)
            } else {
                WordScore::incorrect(
                    *original,
                    MISS_SCORE,
                    format!("Try pronouncing \"{}\" more clearly", original),
                )
            }
        })
        .collect();

    let mut feedback = PronunciationFeedback {
        overall_score: 0,
        word_scores,
        feedback: "Good effort! Keep practicing to improve your pronunciation.".to_string(),
        strengths: vec!["Clear speech attempt".to_string()],
        improvements: vec![
            "Focus on word clarity".to_string(),
            "Practice pronunciation".to_string(),
        ],
    };
    feedback.overall_score = feedback.mean_word_score();
    feedback
}
