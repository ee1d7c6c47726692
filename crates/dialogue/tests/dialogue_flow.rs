//! End-to-end dialogue progression tests
//!
//! Walks a four-turn scripted dialogue through the orchestrator with the
//! deterministic scorer, covering the pass, fail, and skip paths.

use lingua_tutor_core::Language;
use lingua_tutor_dialogue::{
    DialogueError, Orchestrator, Scenario, ScenarioLibrary, ScenarioTurn, Speaker, TurnStatus,
};
use lingua_tutor_scoring::PronunciationScorer;

fn four_turn_scenario() -> Scenario {
    serde_json::from_value(serde_json::json!({
        "id": "greetings-short",
        "title": "Short greetings",
        "language": "english",
        "level": "A1",
        "turns": [
            {"speaker": "scripted_other", "text": "Hello! How are you today?"},
            {"speaker": "learner", "text": "I am fine, thank you."},
            {"speaker": "scripted_other", "text": "What did you do this morning?"},
            {"speaker": "learner", "text": "I went to the market."}
        ]
    }))
    .expect("scenario literal deserializes")
}

#[tokio::test]
async fn test_full_dialogue_with_skip() {
    // Threshold above the deterministic mismatch score so a bad attempt fails
    let orchestrator = Orchestrator::new(80);
    let scorer = PronunciationScorer::deterministic();
    let scenario = four_turn_scenario();

    let state = scenario.start();
    assert_eq!(state.turns.len(), 4);

    // Turn 0: scripted line is delivered
    let state = orchestrator.advance_scripted(state).unwrap();
    assert_eq!(state.index, 1);

    // Turn 1: a good attempt advances to turn 2
    let (feedback, outcome, state) = orchestrator
        .submit_attempt(&scorer, state, "i am fine thank you")
        .await
        .unwrap();
    assert_eq!(feedback.overall_score, 95);
    assert!(outcome.advanced);
    assert_eq!(state.index, 2);

    // Turn 2: scripted line
    let state = orchestrator.advance_scripted(state).unwrap();
    assert_eq!(state.index, 3);

    // Turn 3: a bad attempt stays put, marked incorrect
    let (feedback, outcome, state) = orchestrator
        .submit_attempt(&scorer, state, "something else entirely here")
        .await
        .unwrap();
    assert_eq!(feedback.overall_score, 70);
    assert!(!outcome.advanced);
    assert_eq!(outcome.status, TurnStatus::Incorrect);
    assert_eq!(state.index, 3);

    // Skipping the incorrect turn ends the dialogue
    let state = orchestrator.skip(state).unwrap();
    assert_eq!(state.turns[3].status, TurnStatus::Skipped);
    assert_eq!(state.index, 4);
    assert!(state.is_complete());

    assert!(matches!(
        orchestrator.current_turn(&state),
        Err(DialogueError::OutOfRange { index: 4, len: 4 })
    ));
}

#[tokio::test]
async fn test_retry_path_reaches_correct() {
    let orchestrator = Orchestrator::new(80);
    let scorer = PronunciationScorer::deterministic();
    let scenario = four_turn_scenario();

    let state = orchestrator.advance_scripted(scenario.start()).unwrap();

    // First attempt fails
    let (_, outcome, state) = orchestrator
        .submit_attempt(&scorer, state, "wrong words here entirely")
        .await
        .unwrap();
    assert_eq!(outcome.status, TurnStatus::Incorrect);

    // Retry resets to pending at the same index
    let state = orchestrator.retry(state).unwrap();
    assert_eq!(state.turns[1].status, TurnStatus::Pending);
    assert_eq!(state.index, 1);

    // Second attempt passes
    let (_, outcome, state) = orchestrator
        .submit_attempt(&scorer, state, "I am fine, thank you.")
        .await
        .unwrap();
    assert!(outcome.advanced);
    assert_eq!(state.turns[1].status, TurnStatus::Correct);
}

#[tokio::test]
async fn test_builtin_scenario_first_learner_turn() {
    let orchestrator = Orchestrator::default();
    let scorer = PronunciationScorer::deterministic();
    let library = ScenarioLibrary::builtin();
    let scenario = library.get("cafe-ordering").unwrap();
    assert_eq!(scenario.language, Language::Spanish);

    let state = orchestrator.advance_scripted(scenario.start()).unwrap();
    let expected = state.turns[1].text.clone();

    let (feedback, outcome, _) = orchestrator
        .submit_attempt(&scorer, state, &expected.to_lowercase())
        .await
        .unwrap();
    assert_eq!(feedback.word_scores.len(), expected.split_whitespace().count());
    assert!(outcome.advanced);
}

#[test]
fn test_scenario_turn_speaker_wire_names() {
    let turn: ScenarioTurn =
        serde_json::from_str(r#"{"speaker": "learner", "text": "Hola."}"#).unwrap();
    assert_eq!(turn.speaker, Speaker::Learner);
}
