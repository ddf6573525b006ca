//! Turn orchestrator
//!
//! Runs scoring, complication and response strictly in sequence on a
//! working copy of the caller's state. The copy is only handed back when
//! every non-absorbed stage succeeded, so an aborted turn leaves the
//! caller's state untouched.

use crate::core::config::{EchoConfig, ScoringFailurePolicy};
use crate::core::error::SimulationError;
use crate::core::types::{Stage, TurnNumber};
use crate::exchange::{TurnInput, TurnOutput};
use crate::llm::oracle::Oracle;
use crate::persona::PersonaCatalog;
use crate::pipeline::complication::complicate;
use crate::pipeline::response::respond;
use crate::pipeline::scoring::{score, ScoreOutcome};
use crate::session::SessionState;

/// Result of a completed turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub state: SessionState,
    pub score: ScoreOutcome,
}

/// Sequences the three stages over one session state
pub struct TurnOrchestrator<O> {
    oracle: O,
    catalog: PersonaCatalog,
    config: EchoConfig,
}

impl<O: Oracle> TurnOrchestrator<O> {
    pub fn new(oracle: O, catalog: PersonaCatalog, config: EchoConfig) -> Self {
        Self {
            oracle,
            catalog,
            config,
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn catalog(&self) -> &PersonaCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EchoConfig {
        &self.config
    }

    /// Run one turn and return the next state
    ///
    /// Leading and trailing whitespace is trimmed from `user_text`; the
    /// trimmed text is what the stages see and what lands in the history
    /// and `user_input`.
    pub async fn run_turn(
        &self,
        state: &SessionState,
        user_text: &str,
    ) -> Result<SessionState, SimulationError> {
        self.run_turn_detailed(state, user_text)
            .await
            .map(|outcome| outcome.state)
    }

    /// Run one turn, also reporting how scoring went
    pub async fn run_turn_detailed(
        &self,
        state: &SessionState,
        user_text: &str,
    ) -> Result<TurnOutcome, SimulationError> {
        let user_text = user_text.trim();
        if user_text.is_empty() {
            return Err(SimulationError::EmptyInput);
        }
        let persona = self.catalog.get(state.scenario_key())?;
        if state.turn_count() == TurnNumber::MAX {
            return Err(SimulationError::InvalidState(format!(
                "turn count {} cannot advance",
                state.turn_count()
            )));
        }
        let deadline = self.config.oracle_timeout();

        let history_tail = state.history_tail(self.config.history_window);
        let mut next = state.clone();
        next.begin_turn(user_text);

        let scored = score(&self.oracle, deadline, state.tension(), user_text).await;
        if let ScoreOutcome::Unscored { error, .. } = &scored {
            if self.config.scoring_failure == ScoringFailurePolicy::AbortTurn {
                return Err(SimulationError::stage(Stage::Scoring, error.clone()));
            }
        }
        next.apply_tension(scored.tension());

        let turn = next
            .advance_turn()
            .ok_or_else(|| SimulationError::InvalidState("turn count overflow".into()))?;

        let complication = complicate(
            &self.oracle,
            deadline,
            &self.config.schedule,
            turn,
            next.tension(),
        )
        .await
        .map_err(|e| SimulationError::stage(Stage::Complication, e))?;
        next.set_complication(complication);

        let reply = respond(
            &self.oracle,
            deadline,
            persona,
            next.tension(),
            next.complication(),
            &history_tail,
            user_text,
        )
        .await
        .map_err(|e| SimulationError::stage(Stage::Response, e))?;
        next.record_exchange(user_text, reply);

        tracing::info!(
            "Turn {} complete: tension {} -> {}, heart rate {}",
            turn,
            state.tension(),
            next.tension(),
            next.heart_rate()
        );

        Ok(TurnOutcome {
            state: next,
            score: scored,
        })
    }

    /// Run a turn described by an exchange record from presentation code
    pub async fn run_exchange(&self, input: &TurnInput) -> Result<TurnOutput, SimulationError> {
        let state = SessionState::from_input(input, &self.catalog)?;
        let next = self.run_turn(&state, &input.user_input).await?;
        Ok(TurnOutput::from(&next))
    }
}
