//! Dialogue turn state

use serde::{Deserialize, Serialize};

use lingua_tutor_core::Language;

/// Which party speaks a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// A fixed line from the non-learner party
    ScriptedOther,
    /// A line the learner must produce
    Learner,
}

/// Lifecycle of a single turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// Not yet attempted or shown
    #[default]
    Pending,
    /// Passed scoring, or a scripted line that was delivered
    Correct,
    /// Failed scoring; awaiting retry or skip
    Incorrect,
    /// Moved past without success
    Skipped,
}

/// One entry in a scripted conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueTurn {
    /// Position in the fixed turn sequence
    pub index: usize,

    /// Who speaks this turn
    pub speaker: Speaker,

    /// The scripted line, or the line the learner is expected to produce
    pub text: String,

    /// Current lifecycle state
    pub status: TurnStatus,
}

/// The full state of one dialogue session
///
/// Owned by the caller; the orchestrator only transforms it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueState {
    /// Scenario this dialogue was started from
    pub scenario_id: String,

    /// Language being practiced
    pub language: Language,

    /// Fixed turn sequence
    pub turns: Vec<DialogueTurn>,

    /// Index of the current turn; equal to `turns.len()` when terminal
    pub index: usize,
}

impl DialogueState {
    /// Whether the dialogue has reached its terminal state
    pub fn is_complete(&self) -> bool {
        self.index >= self.turns.len()
    }

    /// Count of learner turns that ended correct
    pub fn correct_learner_turns(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| t.speaker == Speaker::Learner && t.status == TurnStatus::Correct)
            .count()
    }

    /// Count of learner turns in the dialogue
    pub fn learner_turns(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| t.speaker == Speaker::Learner)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_turn_state() -> DialogueState {
        DialogueState {
            scenario_id: "s".into(),
            language: Language::English,
            turns: vec![
                DialogueTurn {
                    index: 0,
                    speaker: Speaker::ScriptedOther,
                    text: "Hi!".into(),
                    status: TurnStatus::Pending,
                },
                DialogueTurn {
                    index: 1,
                    speaker: Speaker::Learner,
                    text: "Hello.".into(),
                    status: TurnStatus::Pending,
                },
            ],
            index: 0,
        }
    }

    #[test]
    fn test_completion() {
        let mut state = two_turn_state();
        assert!(!state.is_complete());
        state.index = 2;
        assert!(state.is_complete());
    }

    #[test]
    fn test_learner_turn_counts() {
        let mut state = two_turn_state();
        assert_eq!(state.learner_turns(), 1);
        assert_eq!(state.correct_learner_turns(), 0);
        state.turns[1].status = TurnStatus::Correct;
        assert_eq!(state.correct_learner_turns(), 1);
    }
}
