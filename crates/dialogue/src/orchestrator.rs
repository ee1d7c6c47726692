//! Turn orchestrator
//!
//! Advances a fixed sequence of dialogue turns, gating learner turns on the
//! scorer's verdict. All operations are value-in/value-out: they consume a
//! state and return the successor, with no side effects. One session's state
//! must be mutated by a single writer; the owning session layer serializes
//! concurrent submissions.

use serde::Serialize;

use lingua_tutor_core::{PronunciationFeedback, UtterancePair};
use lingua_tutor_scoring::PronunciationScorer;

use crate::turn::{DialogueState, DialogueTurn, Speaker, TurnStatus};
use crate::DialogueError;

/// Result of applying an attempt to the current turn
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutcome {
    /// Whether the index moved forward
    pub advanced: bool,
    /// Status the attempted turn ended in
    pub status: TurnStatus,
    /// Current index after the operation
    pub index: usize,
    /// Whether the dialogue reached its terminal state
    pub completed: bool,
}

/// Drives dialogue turn progression
#[derive(Debug, Clone, Copy)]
pub struct Orchestrator {
    pass_threshold: u8,
}

impl Orchestrator {
    /// Create an orchestrator with the given pass threshold
    pub fn new(pass_threshold: u8) -> Self {
        Self { pass_threshold }
    }

    /// Minimum overall score required to advance a learner turn
    pub fn pass_threshold(&self) -> u8 {
        self.pass_threshold
    }

    /// The turn at the current index
    ///
    /// Fails with `OutOfRange` once the dialogue is terminal.
    pub fn current_turn<'a>(
        &self,
        state: &'a DialogueState,
    ) -> Result<&'a DialogueTurn, DialogueError> {
        state.turns.get(state.index).ok_or(DialogueError::OutOfRange {
            index: state.index,
            len: state.turns.len(),
        })
    }

    /// Score a learner attempt and apply the verdict
    ///
    /// Valid only when the current turn is a pending learner turn. On a pass
    /// the turn becomes correct and the index advances; otherwise the turn
    /// becomes incorrect and stays current until `retry` or `skip`.
    pub async fn submit_attempt(
        &self,
        scorer: &PronunciationScorer,
        state: DialogueState,
        transcribed_text: &str,
    ) -> Result<(PronunciationFeedback, AttemptOutcome, DialogueState), DialogueError> {
        {
            let turn = self.current_turn(&state)?;
            if turn.speaker != Speaker::Learner || turn.status != TurnStatus::Pending {
                return Err(DialogueError::InvalidTransition(format!(
                    "submit_attempt requires a pending learner turn, turn {} is {:?} {:?}",
                    turn.index, turn.speaker, turn.status
                )));
            }
        }

        let pair = UtterancePair::new(
            state.turns[state.index].text.clone(),
            transcribed_text,
            state.language,
        );
        let feedback = scorer.score(&pair).await?;

        let (outcome, state) = self.apply_verdict(state, &feedback);
        Ok((feedback, outcome, state))
    }

    /// Apply an already-produced verdict to a pending learner turn
    ///
    /// Split out from `submit_attempt` so the gating rule is testable
    /// without a scorer. The caller has verified the turn is a pending
    /// learner turn.
    fn apply_verdict(
        &self,
        mut state: DialogueState,
        feedback: &PronunciationFeedback,
    ) -> (AttemptOutcome, DialogueState) {
        let passed = feedback.overall_score >= self.pass_threshold;
        let index = state.index;

        if passed {
            state.turns[index].status = TurnStatus::Correct;
            state.index += 1;
        } else {
            state.turns[index].status = TurnStatus::Incorrect;
        }

        tracing::debug!(
            turn = index,
            score = feedback.overall_score,
            threshold = self.pass_threshold,
            passed,
            "attempt applied"
        );

        let outcome = AttemptOutcome {
            advanced: passed,
            status: state.turns[index].status,
            index: state.index,
            completed: state.is_complete(),
        };
        (outcome, state)
    }

    /// Reset an incorrect turn to pending without moving the index
    pub fn retry(&self, mut state: DialogueState) -> Result<DialogueState, DialogueError> {
        let index = state.index;
        {
            let turn = self.current_turn(&state)?;
            if turn.status != TurnStatus::Incorrect {
                return Err(DialogueError::InvalidTransition(format!(
                    "retry requires an incorrect turn, turn {} is {:?}",
                    turn.index, turn.status
                )));
            }
        }

        state.turns[index].status = TurnStatus::Pending;
        Ok(state)
    }

    /// Mark an incorrect turn skipped and move on without success
    pub fn skip(&self, mut state: DialogueState) -> Result<DialogueState, DialogueError> {
        let index = state.index;
        {
            let turn = self.current_turn(&state)?;
            if turn.status != TurnStatus::Incorrect {
                return Err(DialogueError::InvalidTransition(format!(
                    "skip requires an incorrect turn, turn {} is {:?}",
                    turn.index, turn.status
                )));
            }
        }

        state.turns[index].status = TurnStatus::Skipped;
        state.index += 1;
        Ok(state)
    }

    /// Deliver the current scripted line and move to the next turn
    ///
    /// A shown scripted line is marked correct: the script is by definition
    /// delivered as written.
    pub fn advance_scripted(&self, mut state: DialogueState) -> Result<DialogueState, DialogueError> {
        let index = state.index;
        {
            let turn = self.current_turn(&state)?;
            if turn.speaker != Speaker::ScriptedOther || turn.status != TurnStatus::Pending {
                return Err(DialogueError::InvalidTransition(format!(
                    "advance_scripted requires a pending scripted turn, turn {} is {:?} {:?}",
                    turn.index, turn.speaker, turn.status
                )));
            }
        }

        state.turns[index].status = TurnStatus::Correct;
        state.index += 1;
        Ok(state)
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(70)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingua_tutor_core::{Language, WordScore};
    use lingua_tutor_scoring::PronunciationScorer;

    fn state(turns: &[(Speaker, &str)]) -> DialogueState {
        DialogueState {
            scenario_id: "test".into(),
            language: Language::English,
            turns: turns
                .iter()
                .enumerate()
                .map(|(index, (speaker, text))| DialogueTurn {
                    index,
                    speaker: *speaker,
                    text: (*text).to_string(),
                    status: TurnStatus::Pending,
                })
                .collect(),
            index: 0,
        }
    }

    fn feedback_with_score(score: u8) -> PronunciationFeedback {
        PronunciationFeedback {
            overall_score: score,
            word_scores: vec![WordScore::correct("hi", score)],
            feedback: "f".into(),
            strengths: vec![],
            improvements: vec![],
        }
    }

    #[test]
    fn test_current_turn_out_of_range() {
        let orchestrator = Orchestrator::default();
        let mut s = state(&[(Speaker::Learner, "Hello.")]);
        s.index = 1;

        assert!(matches!(
            orchestrator.current_turn(&s),
            Err(DialogueError::OutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_pass_advances_index() {
        let orchestrator = Orchestrator::new(70);
        let s = state(&[(Speaker::Learner, "Hello."), (Speaker::ScriptedOther, "Hi.")]);

        let (outcome, s) = orchestrator.apply_verdict(s, &feedback_with_score(70));
        assert!(outcome.advanced);
        assert_eq!(outcome.status, TurnStatus::Correct);
        assert_eq!(s.index, 1);
    }

    #[test]
    fn test_fail_never_advances_index() {
        let orchestrator = Orchestrator::new(70);
        let s = state(&[(Speaker::Learner, "Hello.")]);

        let (outcome, s) = orchestrator.apply_verdict(s, &feedback_with_score(69));
        assert!(!outcome.advanced);
        assert_eq!(outcome.status, TurnStatus::Incorrect);
        assert_eq!(s.index, 0);
        assert!(!outcome.completed);
    }

    #[test]
    fn test_retry_only_from_incorrect() {
        let orchestrator = Orchestrator::default();
        let s = state(&[(Speaker::Learner, "Hello.")]);

        // Retrying a pending turn is a contract violation
        assert!(matches!(
            orchestrator.retry(s.clone()),
            Err(DialogueError::InvalidTransition(_))
        ));

        let (_, s) = orchestrator.apply_verdict(s, &feedback_with_score(10));
        let s = orchestrator.retry(s).unwrap();
        assert_eq!(s.turns[0].status, TurnStatus::Pending);
        assert_eq!(s.index, 0);
    }

    #[test]
    fn test_skip_only_from_incorrect() {
        let orchestrator = Orchestrator::default();
        let s = state(&[(Speaker::Learner, "Hello."), (Speaker::Learner, "Bye.")]);

        assert!(matches!(
            orchestrator.skip(s.clone()),
            Err(DialogueError::InvalidTransition(_))
        ));

        let (_, s) = orchestrator.apply_verdict(s, &feedback_with_score(10));
        let s = orchestrator.skip(s).unwrap();
        assert_eq!(s.turns[0].status, TurnStatus::Skipped);
        assert_eq!(s.index, 1);
    }

    #[test]
    fn test_advance_scripted() {
        let orchestrator = Orchestrator::default();
        let s = state(&[(Speaker::ScriptedOther, "Hi!"), (Speaker::Learner, "Hello.")]);

        let s = orchestrator.advance_scripted(s).unwrap();
        assert_eq!(s.turns[0].status, TurnStatus::Correct);
        assert_eq!(s.index, 1);

        // The learner turn cannot be advanced as scripted
        assert!(matches!(
            orchestrator.advance_scripted(s),
            Err(DialogueError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_requires_pending_learner_turn() {
        let orchestrator = Orchestrator::default();
        let scorer = PronunciationScorer::deterministic();
        let s = state(&[(Speaker::ScriptedOther, "Hi!")]);

        let err = orchestrator
            .submit_attempt(&scorer, s, "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, DialogueError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_submit_scores_against_turn_text() {
        let orchestrator = Orchestrator::new(70);
        let scorer = PronunciationScorer::deterministic();
        let s = state(&[(Speaker::Learner, "Good morning")]);

        let (feedback, outcome, s) = orchestrator
            .submit_attempt(&scorer, s, "good morning")
            .await
            .unwrap();
        assert_eq!(feedback.overall_score, 95);
        assert!(outcome.advanced);
        assert!(outcome.completed);
        assert!(s.is_complete());
    }

    #[tokio::test]
    async fn test_empty_attempt_surfaces_input_error() {
        let orchestrator = Orchestrator::default();
        let scorer = PronunciationScorer::deterministic();
        let s = state(&[(Speaker::Learner, "Good morning")]);

        let err = orchestrator
            .submit_attempt(&scorer, s, "   ")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DialogueError::Scoring(lingua_tutor_core::Error::Input(_))
        ));
    }
}
