//! Scripted dialogue practice
//!
//! A dialogue is a fixed sequence of turns alternating between a scripted
//! party and the learner. The orchestrator advances the sequence one turn at
//! a time, gating learner turns on the pronunciation scorer's verdict. State
//! transitions are pure; persistence and session ownership belong to the
//! caller.

pub mod orchestrator;
pub mod scenario;
pub mod turn;

pub use orchestrator::{AttemptOutcome, Orchestrator};
pub use scenario::{Scenario, ScenarioLibrary, ScenarioTurn};
pub use turn::{DialogueState, DialogueTurn, Speaker, TurnStatus};

use thiserror::Error;

/// Dialogue errors
#[derive(Error, Debug)]
pub enum DialogueError {
    /// The current index is past the end of the turn sequence (terminal)
    #[error("turn {index} is out of range for a dialogue of {len} turns")]
    OutOfRange { index: usize, len: usize },

    /// An operation was applied to a turn in the wrong state
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Scoring failed while submitting an attempt
    #[error(transparent)]
    Scoring(#[from] lingua_tutor_core::Error),
}
