//! Complication stage
//!
//! Only scheduled checkpoint turns reach the oracle. Every other turn gets
//! the "None" sentinel without a call.

use crate::core::error::OracleError;
use crate::core::types::{Stage, Tension, TurnNumber};
use crate::llm::oracle::{generate_within, Oracle, Prompt};
use crate::schedule::{ComplicationSchedule, Severity};
use std::time::Duration;

/// Sentinel for "nothing happens this turn"
pub const NO_COMPLICATION: &str = "None";

/// Whether a complication text describes an actual event
pub fn has_complication(text: &str) -> bool {
    let text = text.trim().trim_matches('"');
    !text.is_empty() && !text.eq_ignore_ascii_case(NO_COMPLICATION)
}

/// Complication text for `turn`, passed through from the oracle unmodified
pub async fn complicate<O: Oracle>(
    oracle: &O,
    deadline: Duration,
    schedule: &ComplicationSchedule,
    turn: TurnNumber,
    tension: Tension,
) -> Result<String, OracleError> {
    let severity = schedule.severity_for(turn);
    if severity.is_none() {
        return Ok(NO_COMPLICATION.to_string());
    }

    tracing::debug!("Turn {} is a {:?} complication checkpoint", turn, severity);
    let prompt = complication_prompt(turn, tension, severity);
    generate_within(oracle, &prompt, deadline).await
}

pub fn complication_prompt(turn: TurnNumber, tension: Tension, severity: Severity) -> Prompt {
    let user = format!(
        "Current State:\n- Turn Count: {}\n- Tension: {}/100\n\nInject {} complication.",
        turn,
        tension,
        severity.describe()
    );
    Prompt::new(Stage::Complication, COMPLICATION_SYSTEM_PROMPT, user)
}

/// System prompt for complication injection
const COMPLICATION_SYSTEM_PROMPT: &str = r#"You are the Director, controlling the difficulty of a crisis negotiation training simulation.
You inject environmental complications that make the negotiation harder.

A minor complication is a distraction. A major complication is an event that directly threatens progress.

Complication examples:
- "A loud alarm goes off."
- "Another nurse walks in and yells."
- "The lights flicker."

Output just the complication text (one sentence), or the single word None if nothing should happen.
"#;
