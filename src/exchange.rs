//! Turn records exchanged with presentation code
//!
//! Presentation layers (web pages, TUIs, ...) hand a [`TurnInput`] to the
//! orchestrator and render the [`TurnOutput`]. Inputs are validated here
//! before they become a [`SessionState`].

use crate::core::error::SimulationError;
use crate::core::types::{HistoryEntry, ScenarioKey, Tension, TurnNumber};
use crate::persona::PersonaCatalog;
use crate::session::SessionState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnInput {
    pub tension: i64,
    pub turn_count: TurnNumber,
    pub scenario_key: String,
    pub user_input: String,
    /// Rendered history lines ("User: ..." / "AI: ...")
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default = "default_complication")]
    pub complication: String,
}

fn default_complication() -> String {
    crate::pipeline::NO_COMPLICATION.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnOutput {
    pub tension: u8,
    pub heart_rate: u16,
    pub turn_count: TurnNumber,
    pub complication: String,
    pub actor_response: String,
    pub history: Vec<String>,
}

impl SessionState {
    /// Rebuild a state from an exchange record
    pub fn from_input(input: &TurnInput, catalog: &PersonaCatalog) -> Result<Self, SimulationError> {
        let scenario_key = ScenarioKey::new(input.scenario_key.clone());
        if !catalog.contains(&scenario_key) {
            return Err(SimulationError::UnknownScenario(input.scenario_key.clone()));
        }

        let tension = Tension::try_from(input.tension).map_err(SimulationError::InvalidState)?;
        if input.turn_count == TurnNumber::MAX {
            return Err(SimulationError::InvalidState(format!(
                "turn count {} cannot advance",
                input.turn_count
            )));
        }

        let history = input
            .history
            .iter()
            .map(|line| {
                HistoryEntry::parse_line(line).ok_or_else(|| {
                    SimulationError::InvalidState(format!("Unrecognized history line: {}", line))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::restore(
            scenario_key,
            tension,
            input.turn_count,
            input.complication.clone(),
            history,
        ))
    }

    /// Exchange record for the next turn of this state
    pub fn to_input(&self, user_input: impl Into<String>) -> TurnInput {
        TurnInput {
            tension: self.tension().into(),
            turn_count: self.turn_count(),
            scenario_key: self.scenario_key().to_string(),
            user_input: user_input.into(),
            history: self.history().iter().map(|e| e.to_string()).collect(),
            complication: self.complication().to_string(),
        }
    }
}

impl From<&SessionState> for TurnOutput {
    fn from(state: &SessionState) -> Self {
        Self {
            tension: state.tension().value(),
            heart_rate: state.heart_rate().0,
            turn_count: state.turn_count(),
            complication: state.complication().to_string(),
            actor_response: state.actor_response().to_string(),
            history: state.history().iter().map(|e| e.to_string()).collect(),
        }
    }
}
