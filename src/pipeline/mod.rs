//! The turn pipeline
//!
//! Scoring -> complication -> response, composed by the orchestrator.
//! Each stage only talks to the oracle through [`crate::llm::oracle::Oracle`].

pub mod complication;
pub mod orchestrator;
pub mod response;
pub mod scoring;

pub use complication::{has_complication, NO_COMPLICATION};
pub use orchestrator::{TurnOrchestrator, TurnOutcome};
pub use scoring::{Score, ScoreOutcome, ScoreRecord};
