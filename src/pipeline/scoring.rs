//! Scoring stage
//!
//! Asks the oracle how the trainee's message moves the persona's tension.
//! This stage never fails: oracle errors and malformed records degrade to
//! "no change" and are reported through [`ScoreOutcome::Unscored`].

use crate::core::error::OracleError;
use crate::core::types::{Stage, Tension};
use crate::llm::oracle::{generate_structured, Oracle, Prompt};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Structured record the oracle must return
///
/// Numeric fields accept any JSON number (`70`, `70.0`, `1e20`); only
/// non-numeric values are a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    #[serde(deserialize_with = "any_number")]
    pub tension_change: i64,
    #[serde(default)]
    pub reasoning: String,
    /// Expected within 0..=100, clamped regardless
    #[serde(deserialize_with = "any_number")]
    pub new_tension: i64,
}

/// Round a JSON number to the nearest integer, saturating at the `i64` bounds
fn any_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(n) = number.as_i64() {
        return Ok(n);
    }
    if number.as_u64().is_some() {
        return Ok(i64::MAX);
    }
    number
        .as_f64()
        .map(|f| f.round() as i64)
        .ok_or_else(|| de::Error::custom(format!("unrepresentable number {}", number)))
}

/// A successfully scored turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Score {
    pub prior: Tension,
    pub tension: Tension,
    /// Change claimed by the oracle, before clamping
    pub reported_change: i64,
    pub rationale: String,
}

impl Score {
    /// Change actually applied to the tension
    pub fn applied_delta(&self) -> i16 {
        self.tension.value() as i16 - self.prior.value() as i16
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    Scored(Score),
    /// Scoring failed; the prior tension stands
    Unscored { prior: Tension, error: OracleError },
}

impl ScoreOutcome {
    /// Tension to carry into the rest of the turn
    pub fn tension(&self) -> Tension {
        match self {
            ScoreOutcome::Scored(score) => score.tension,
            ScoreOutcome::Unscored { prior, .. } => *prior,
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, ScoreOutcome::Scored(_))
    }

    pub fn score(&self) -> Option<&Score> {
        match self {
            ScoreOutcome::Scored(score) => Some(score),
            ScoreOutcome::Unscored { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&OracleError> {
        match self {
            ScoreOutcome::Scored(_) => None,
            ScoreOutcome::Unscored { error, .. } => Some(error),
        }
    }
}

/// Score a user message against the current tension
pub async fn score<O: Oracle>(
    oracle: &O,
    deadline: Duration,
    current: Tension,
    user_text: &str,
) -> ScoreOutcome {
    let prompt = scoring_prompt(current, user_text);

    match generate_structured::<ScoreRecord, _>(oracle, &prompt, deadline).await {
        Ok(record) => {
            let tension = Tension::clamped(record.new_tension);
            tracing::debug!(
                "Scored turn: {} -> {} (reported change {}): {}",
                current,
                tension,
                record.tension_change,
                record.reasoning
            );
            ScoreOutcome::Scored(Score {
                prior: current,
                tension,
                reported_change: record.tension_change,
                rationale: record.reasoning,
            })
        }
        Err(error) => {
            tracing::warn!("Scoring failed, keeping tension at {}: {}", current, error);
            ScoreOutcome::Unscored {
                prior: current,
                error,
            }
        }
    }
}

/// Build the scoring request
pub fn scoring_prompt(current: Tension, user_text: &str) -> Prompt {
    let user = format!(
        "Current Tension: {}\n\nUser Input: \"{}\"\n\nScore this message as JSON:",
        current, user_text
    );
    Prompt::new(Stage::Scoring, SCORING_SYSTEM_PROMPT, user).with_temperature(0.0)
}

/// System prompt for tension scoring
const SCORING_SYSTEM_PROMPT: &str = r#"You are the Monitor, an invisible judge of a crisis negotiation training simulation.
Decide whether the trainee's message de-escalates or escalates the situation.

RULES:
- Validating feelings ("I can see you're scared"): tension -10
- Giving orders ("Calm down", "Sit still"): tension +15
- Neutral statements: tension +0
- Aggressive, threatening or insulting language: tension +20

Apply the change to the current tension. Tension is always between 0 and 100.

OUTPUT FORMAT (JSON only, no explanation):
{
  "tension_change": integer,
  "reasoning": "one short sentence",
  "new_tension": integer between 0 and 100
}

Examples:
Current 90, "I can see how frightened you are." -> {"tension_change": -10, "reasoning": "Validates fear", "new_tension": 80}
Current 60, "Calm down right now." -> {"tension_change": 15, "reasoning": "Direct order", "new_tension": 75}
"#;
