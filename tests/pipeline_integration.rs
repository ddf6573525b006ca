//! Integration tests for the turn pipeline
//!
//! These tests drive whole turns through the orchestrator and the session
//! owner with a stub oracle:
//! - Scoring, complication and response merged into the next state
//! - Complication checkpoints and the "None" sentinel
//! - Scoring failures absorbed, later stage failures aborting the turn
//! - Deadlines on oracle calls

mod common;

use common::StubOracle;
use echo_crisis::core::config::{EchoConfig, ScoringFailurePolicy};
use echo_crisis::core::error::{OracleError, ParseError, SimulationError};
use echo_crisis::core::types::{HeartRate, ScenarioKey, Stage};
use echo_crisis::exchange::{TurnInput, TurnOutput};
use echo_crisis::persona::PersonaCatalog;
use echo_crisis::pipeline::{TurnOrchestrator, NO_COMPLICATION};
use echo_crisis::schedule::{ComplicationSchedule, Severity};
use echo_crisis::session::{Session, SessionState};
use std::time::Duration;

fn orchestrator(oracle: StubOracle) -> TurnOrchestrator<StubOracle> {
    TurnOrchestrator::new(oracle, PersonaCatalog::builtin(), EchoConfig::default())
}

fn start_state(key: &str) -> SessionState {
    let catalog = PersonaCatalog::builtin();
    SessionState::new(catalog.get(&ScenarioKey::new(key)).unwrap())
}

fn input_at(turn_count: u32, tension: i64) -> TurnInput {
    TurnInput {
        tension,
        turn_count,
        scenario_key: "ER".into(),
        user_input: "I'm right here with you".into(),
        history: Vec::new(),
        complication: NO_COMPLICATION.into(),
    }
}

// ============================================================================
// Full turns
// ============================================================================

/// A validating first message lowers tension and heart rate together
#[tokio::test]
async fn test_first_turn_validating_message() {
    let orch = orchestrator(
        StubOracle::new()
            .score(-10, 80)
            .push(Stage::Response, Ok("You... you really think it's not poison?".into())),
    );
    let state = start_state("ER");

    let next = orch.run_turn(&state, "I can see you're scared").await.unwrap();

    assert_eq!(next.tension().value(), 80);
    assert_eq!(next.heart_rate(), HeartRate(140));
    assert_eq!(next.turn_count(), 1);
    assert_eq!(next.complication(), NO_COMPLICATION);
    assert_eq!(next.history().len(), 2);
    assert_eq!(next.history()[0].to_string(), "User: I can see you're scared");
    assert_eq!(
        next.history()[1].to_string(),
        "AI: You... you really think it's not poison?"
    );
    assert_eq!(orch.oracle().calls(Stage::Complication), 0);

    // input state untouched
    assert_eq!(state, start_state("ER"));
}

/// Out-of-range tension from the scorer is clamped
#[tokio::test]
async fn test_scorer_tension_clamped() {
    let orch = orchestrator(StubOracle::new().score(40, 130).score(-200, -5));
    let state = start_state("Customer");

    let high = orch.run_turn(&state, "Whatever").await.unwrap();
    assert_eq!(high.tension().value(), 100);
    assert_eq!(high.heart_rate(), HeartRate(160));

    let low = orch.run_turn(&high, "I'm so sorry").await.unwrap();
    assert_eq!(low.tension().value(), 0);
    assert_eq!(low.heart_rate(), HeartRate(60));
}

/// The response stage sees the scored tension and the persona directive
#[tokio::test]
async fn test_response_prompt_uses_updated_tension() {
    let orch = orchestrator(StubOracle::new().score(15, 95));
    let state = start_state("School");

    orch.run_turn(&state, "Sit down right now").await.unwrap();

    let prompt = orch.oracle().last_prompt(Stage::Response).unwrap();
    assert!(prompt.user.contains("Tension Level: 95/100"));
    assert!(prompt.user.contains("Sit down right now"));
    assert!(prompt.system.contains("Alex"));
}

/// Only the last five history entries reach the response prompt
#[tokio::test]
async fn test_history_window_in_response_prompt() {
    let orch = orchestrator(StubOracle::new());
    let mut input = input_at(4, 70);
    input.history = (0..4)
        .flat_map(|i| [format!("User: message {}", i), format!("AI: reply {}", i)])
        .collect();

    orch.run_exchange(&input).await.unwrap();

    let prompt = orch.oracle().last_prompt(Stage::Response).unwrap();
    assert!(!prompt.user.contains("message 1"));
    assert!(prompt.user.contains("reply 1"));
    assert!(prompt.user.contains("reply 3"));
}

// ============================================================================
// Complication schedule
// ============================================================================

/// Turn 2 -> 3 hits the minor checkpoint; 3 -> 4 does not call the oracle
#[tokio::test]
async fn test_checkpoint_turns() {
    let orch = orchestrator(StubOracle::new());

    let at_three: TurnOutput = orch.run_exchange(&input_at(2, 60)).await.unwrap();
    assert_eq!(at_three.turn_count, 3);
    assert_eq!(at_three.complication, "A loud alarm goes off.");
    assert_eq!(orch.oracle().calls(Stage::Complication), 1);
    let prompt = orch.oracle().last_prompt(Stage::Complication).unwrap();
    assert!(prompt.user.contains("a minor complication"));

    let mut next = input_at(3, at_three.tension as i64);
    next.complication = at_three.complication.clone();
    let at_four = orch.run_exchange(&next).await.unwrap();
    assert_eq!(at_four.turn_count, 4);
    assert_eq!(at_four.complication, NO_COMPLICATION);
    assert_eq!(orch.oracle().calls(Stage::Complication), 1);
}

/// Turn 6 asks for a major complication
#[tokio::test]
async fn test_major_checkpoint() {
    let orch = orchestrator(StubOracle::new());
    orch.run_exchange(&input_at(5, 60)).await.unwrap();

    let prompt = orch.oracle().last_prompt(Stage::Complication).unwrap();
    assert!(prompt.user.contains("a major complication"));
    assert!(prompt.user.contains("Turn Count: 6"));
}

/// Checkpoint text is passed through even when it is the "None" sentinel
#[tokio::test]
async fn test_checkpoint_may_return_none() {
    let orch = orchestrator(StubOracle::new().push(Stage::Complication, Ok("None".into())));
    let output = orch.run_exchange(&input_at(2, 60)).await.unwrap();
    assert_eq!(output.complication, "None");
    assert_eq!(orch.oracle().calls(Stage::Complication), 1);
}

/// A custom schedule replaces the default checkpoints
#[tokio::test]
async fn test_custom_schedule() {
    let config = EchoConfig {
        schedule: ComplicationSchedule::from_checkpoints([(1, Severity::Major)]),
        ..EchoConfig::default()
    };
    let orch = TurnOrchestrator::new(StubOracle::new(), PersonaCatalog::builtin(), config);

    let first = orch.run_turn(&start_state("ER"), "Hello").await.unwrap();
    assert_eq!(first.complication(), "A loud alarm goes off.");

    let mut state = first;
    for _ in 0..5 {
        state = orch.run_turn(&state, "Go on").await.unwrap();
    }
    assert_eq!(state.turn_count(), 6);
    assert_eq!(orch.oracle().calls(Stage::Complication), 1);
}

// ============================================================================
// Failure handling
// ============================================================================

/// A scoring transport failure keeps the prior tension and still replies
#[tokio::test]
async fn test_scoring_failure_absorbed() {
    let orch = orchestrator(
        StubOracle::new()
            .push(Stage::Scoring, Err(OracleError::Transport("connection reset".into())))
            .push(Stage::Response, Ok("Who are you?!".into())),
    );
    let state = start_state("ER");

    let outcome = orch.run_turn_detailed(&state, "Hello").await.unwrap();
    assert!(!outcome.score.is_scored());
    assert_eq!(outcome.state.tension().value(), 90);
    assert_eq!(outcome.state.heart_rate(), HeartRate(150));
    assert_eq!(outcome.state.turn_count(), 1);
    assert_eq!(outcome.state.actor_response(), "Who are you?!");
}

/// Malformed scoring output is absorbed the same way as a transport failure
#[tokio::test]
async fn test_malformed_score_absorbed() {
    let replies = [
        "I think the tension went down a bit.",
        r#"{"tension_change": "a lot", "new_tension": 80}"#,
        r#"{"reasoning": "missing numbers"}"#,
    ];

    for reply in replies {
        let orch = orchestrator(StubOracle::new().push(Stage::Scoring, Ok(reply.into())));
        let outcome = orch
            .run_turn_detailed(&start_state("Customer"), "Sorry for the wait")
            .await
            .unwrap();
        assert!(matches!(outcome.score.error(), Some(OracleError::Parse(_))));
        assert_eq!(outcome.state.tension().value(), 95);
        assert_eq!(outcome.state.turn_count(), 1);
    }
}

/// With the abort policy a scoring failure fails the turn
#[tokio::test]
async fn test_scoring_failure_abort_policy() {
    let config = EchoConfig {
        scoring_failure: ScoringFailurePolicy::AbortTurn,
        ..EchoConfig::default()
    };
    let oracle = StubOracle::new().push(
        Stage::Scoring,
        Err(OracleError::Parse(ParseError::new("No JSON found", "hmm"))),
    );
    let orch = TurnOrchestrator::new(oracle, PersonaCatalog::builtin(), config);

    let err = orch.run_turn(&start_state("ER"), "Hello").await.unwrap_err();
    assert_eq!(err.failed_stage(), Some(Stage::Scoring));
    assert_eq!(orch.oracle().calls(Stage::Response), 0);
}

/// A response failure aborts the turn and reports the stage
#[tokio::test]
async fn test_response_failure_aborts_turn() {
    let orch = orchestrator(
        StubOracle::new()
            .score(-10, 80)
            .push(Stage::Response, Err(OracleError::Api { status: 503, body: "overloaded".into() })),
    );
    let state = start_state("ER");

    let err = orch.run_turn(&state, "I can see you're scared").await.unwrap_err();
    assert_eq!(err.failed_stage(), Some(Stage::Response));
    assert_eq!(orch.oracle().calls(Stage::Scoring), 1);
    assert_eq!(orch.oracle().calls(Stage::Response), 1);
}

/// A complication failure aborts the turn before the response stage
#[tokio::test]
async fn test_complication_failure_aborts_turn() {
    let orch = orchestrator(
        StubOracle::new().push(Stage::Complication, Err(OracleError::EmptyResponse)),
    );

    let err = orch.run_exchange(&input_at(2, 60)).await.unwrap_err();
    assert_eq!(
        err,
        SimulationError::Stage {
            stage: Stage::Complication,
            source: OracleError::EmptyResponse,
        }
    );
    assert_eq!(orch.oracle().calls(Stage::Response), 0);
}

/// A slow response hits the configured deadline
#[tokio::test]
async fn test_response_deadline() {
    let config = EchoConfig::default().with_oracle_timeout(Duration::from_millis(20));
    let oracle = StubOracle::new().delay(Stage::Response, Duration::from_millis(500));
    let orch = TurnOrchestrator::new(oracle, PersonaCatalog::builtin(), config);

    let err = orch.run_turn(&start_state("ER"), "Hello").await.unwrap_err();
    assert_eq!(
        err,
        SimulationError::Stage {
            stage: Stage::Response,
            source: OracleError::Timeout(Duration::from_millis(20)),
        }
    );
}

/// A slow scorer is absorbed like any other scoring failure
#[tokio::test]
async fn test_scoring_deadline_absorbed() {
    let config = EchoConfig::default().with_oracle_timeout(Duration::from_millis(20));
    let oracle = StubOracle::new().delay(Stage::Scoring, Duration::from_millis(500));
    let orch = TurnOrchestrator::new(oracle, PersonaCatalog::builtin(), config);

    let outcome = orch.run_turn_detailed(&start_state("ER"), "Hello").await.unwrap();
    assert!(matches!(outcome.score.error(), Some(OracleError::Timeout(_))));
    assert_eq!(outcome.state.tension().value(), 90);
}

/// A turn counter at its maximum is rejected instead of silently not advancing
#[tokio::test]
async fn test_turn_count_at_limit_rejected() {
    let orch = orchestrator(StubOracle::new());

    let err = orch.run_exchange(&input_at(u32::MAX, 50)).await.unwrap_err();
    assert!(matches!(err, SimulationError::InvalidState(_)));
    assert_eq!(orch.oracle().calls(Stage::Scoring), 0);

    let last = orch.run_exchange(&input_at(u32::MAX - 1, 50)).await.unwrap();
    assert_eq!(last.turn_count, u32::MAX);
}

/// A float tension from the scorer is rounded, not treated as unparseable
#[tokio::test]
async fn test_float_score_applied() {
    let orch = orchestrator(StubOracle::new().push(
        Stage::Scoring,
        Ok(r#"{"tension_change": -10.0, "reasoning": "ok", "new_tension": 70.0}"#.into()),
    ));

    let outcome = orch
        .run_turn_detailed(&start_state("ER"), "I can see you're scared")
        .await
        .unwrap();
    assert!(outcome.score.is_scored());
    assert_eq!(outcome.state.tension().value(), 70);
    assert_eq!(outcome.state.heart_rate(), HeartRate(130));
}

/// Unknown scenarios and empty input are rejected before any oracle call
#[tokio::test]
async fn test_rejected_before_oracle() {
    let orch = orchestrator(StubOracle::new());

    let mut unknown = input_at(0, 50);
    unknown.scenario_key = "Zoo".into();
    let err = orch.run_exchange(&unknown).await.unwrap_err();
    assert_eq!(err, SimulationError::UnknownScenario("Zoo".into()));

    let err = orch.run_turn(&start_state("ER"), "  \n").await.unwrap_err();
    assert_eq!(err, SimulationError::EmptyInput);

    assert_eq!(orch.oracle().calls(Stage::Scoring), 0);
}

// ============================================================================
// Session owner
// ============================================================================

/// Failed turns leave the session exactly as it was; later turns still work
#[tokio::test]
async fn test_session_survives_failed_turn() {
    let orch = orchestrator(
        StubOracle::new()
            .score(-10, 80)
            .push(Stage::Response, Err(OracleError::EmptyResponse))
            .score(-10, 70),
    );
    let catalog = PersonaCatalog::builtin();
    let mut session =
        Session::for_scenario(&catalog, &ScenarioKey::new("ER"), orch.config()).unwrap();
    let before = session.state().clone();

    assert!(session.submit(&orch, "I can see you're scared").await.is_err());
    assert_eq!(session.state(), &before);
    assert!(session.log().is_empty());

    let record = session.submit(&orch, "Take your time").await.unwrap().clone();
    assert_eq!(record.turn, 1);
    assert_eq!(record.tension.value(), 70);
    assert_eq!(session.state().history().len(), 2);
}

/// Reset after several turns returns to the persona's starting state
#[tokio::test]
async fn test_session_reset() {
    let orch = orchestrator(StubOracle::new().score(-10, 80).score(-10, 70).score(-10, 60));
    let catalog = PersonaCatalog::builtin();
    let mut session =
        Session::for_scenario(&catalog, &ScenarioKey::new("ER"), orch.config()).unwrap();

    for text in ["one", "two", "three"] {
        session.submit(&orch, text).await.unwrap();
    }
    assert_eq!(session.state().turn_count(), 3);
    assert_eq!(session.log()[2].complication, "A loud alarm goes off.");

    session.reset();
    assert_eq!(session.state(), &start_state("ER"));
    assert!(session.log().is_empty());
}
