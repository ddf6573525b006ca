//! Session state and the single-writer session owner
//!
//! [`SessionState`] is the record the pipeline transforms. Its tension and
//! heart rate are only ever updated together, so the heart rate can never
//! go stale. [`Session`] owns one state, commits only completed turns and
//! keeps the turn log and tension trace used for reporting.

use crate::core::config::EchoConfig;
use crate::core::error::SimulationError;
use crate::core::types::{HeartRate, HistoryEntry, ScenarioKey, SessionId, Tension, TurnNumber};
use crate::llm::oracle::Oracle;
use crate::persona::{PersonaCatalog, PersonaDescriptor};
use crate::pipeline::{TurnOrchestrator, NO_COMPLICATION};
use serde::Serialize;
use std::collections::VecDeque;

/// Per-conversation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    scenario_key: ScenarioKey,
    tension: Tension,
    heart_rate: HeartRate,
    turn_count: TurnNumber,
    complication: String,
    history: Vec<HistoryEntry>,
    user_input: String,
    actor_response: String,
}

impl SessionState {
    /// Fresh state for a persona's scenario
    pub fn new(persona: &PersonaDescriptor) -> Self {
        Self::restore(
            persona.key.clone(),
            persona.initial_tension,
            0,
            NO_COMPLICATION.to_string(),
            Vec::new(),
        )
    }

    pub(crate) fn restore(
        scenario_key: ScenarioKey,
        tension: Tension,
        turn_count: TurnNumber,
        complication: String,
        history: Vec<HistoryEntry>,
    ) -> Self {
        Self {
            scenario_key,
            tension,
            heart_rate: tension.heart_rate(),
            turn_count,
            complication,
            history,
            user_input: String::new(),
            actor_response: String::new(),
        }
    }

    pub fn scenario_key(&self) -> &ScenarioKey {
        &self.scenario_key
    }

    pub fn tension(&self) -> Tension {
        self.tension
    }

    pub fn heart_rate(&self) -> HeartRate {
        self.heart_rate
    }

    pub fn turn_count(&self) -> TurnNumber {
        self.turn_count
    }

    pub fn complication(&self) -> &str {
        &self.complication
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    pub fn actor_response(&self) -> &str {
        &self.actor_response
    }

    /// The last `window` history lines, rendered for a prompt
    pub fn history_tail(&self, window: usize) -> Vec<String> {
        let start = self.history.len().saturating_sub(window);
        self.history[start..].iter().map(|e| e.to_string()).collect()
    }

    /// Start a turn: transient fields overwritten, complication cleared
    pub(crate) fn begin_turn(&mut self, user_text: &str) {
        self.user_input = user_text.to_string();
        self.actor_response.clear();
        self.complication = NO_COMPLICATION.to_string();
    }

    pub(crate) fn apply_tension(&mut self, tension: Tension) {
        self.tension = tension;
        self.heart_rate = tension.heart_rate();
    }

    /// `None` when the counter cannot advance; the count is left as is
    pub(crate) fn advance_turn(&mut self) -> Option<TurnNumber> {
        self.turn_count = self.turn_count.checked_add(1)?;
        Some(self.turn_count)
    }

    pub(crate) fn set_complication(&mut self, complication: String) {
        self.complication = complication;
    }

    pub(crate) fn record_exchange(&mut self, user_text: &str, reply: String) {
        self.history.push(HistoryEntry::user(user_text));
        self.history.push(HistoryEntry::actor(reply.clone()));
        self.actor_response = reply;
    }
}

/// One committed turn, as shown in the turn log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnRecord {
    pub turn: TurnNumber,
    pub tension: Tension,
    pub heart_rate: HeartRate,
    /// False when scoring failed and the prior tension was kept
    pub scored: bool,
    pub rationale: Option<String>,
    pub complication: String,
    pub actor_response: String,
}

/// Owner of one conversation
///
/// `submit` takes `&mut self`, so two turns can never be in flight on the
/// same session.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    persona: PersonaDescriptor,
    state: SessionState,
    log: Vec<TurnRecord>,
    trace: VecDeque<Tension>,
    trace_len: usize,
}

impl Session {
    pub fn start(persona: PersonaDescriptor, config: &EchoConfig) -> Self {
        let state = SessionState::new(&persona);
        let trace_len = config.trace_len.max(1);
        let id = SessionId::new();
        tracing::info!("Session {} started for scenario {}", id, persona.key);
        Self {
            id,
            trace: std::iter::repeat(persona.initial_tension)
                .take(trace_len)
                .collect(),
            persona,
            state,
            log: Vec::new(),
            trace_len,
        }
    }

    /// Start a session for a scenario key from the catalog
    pub fn for_scenario(
        catalog: &PersonaCatalog,
        key: &ScenarioKey,
        config: &EchoConfig,
    ) -> Result<Self, SimulationError> {
        let persona = catalog.get(key)?.clone();
        Ok(Self::start(persona, config))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn persona(&self) -> &PersonaDescriptor {
        &self.persona
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn log(&self) -> &[TurnRecord] {
        &self.log
    }

    /// Rolling tension trace, oldest first
    pub fn trace(&self) -> impl ExactSizeIterator<Item = Tension> + '_ {
        self.trace.iter().copied()
    }

    /// Run one turn and commit it
    ///
    /// On failure nothing is committed and the session stays usable.
    pub async fn submit<O: Oracle>(
        &mut self,
        orchestrator: &TurnOrchestrator<O>,
        user_text: &str,
    ) -> Result<&TurnRecord, SimulationError> {
        let outcome = match orchestrator.run_turn_detailed(&self.state, user_text).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(
                    "Session {}: turn {} aborted, keeping pre-turn state: {}",
                    self.id,
                    self.state.turn_count().saturating_add(1),
                    err
                );
                return Err(err);
            }
        };

        let state = outcome.state;
        let record = TurnRecord {
            turn: state.turn_count(),
            tension: state.tension(),
            heart_rate: state.heart_rate(),
            scored: outcome.score.is_scored(),
            rationale: outcome.score.score().map(|s| s.rationale.clone()),
            complication: state.complication().to_string(),
            actor_response: state.actor_response().to_string(),
        };

        self.trace.push_back(state.tension());
        while self.trace.len() > self.trace_len {
            self.trace.pop_front();
        }
        self.state = state;
        self.log.push(record);

        Ok(&self.log[self.log.len() - 1])
    }

    /// Back to the persona's starting point
    pub fn reset(&mut self) {
        self.state = SessionState::new(&self.persona);
        self.log.clear();
        self.trace = std::iter::repeat(self.persona.initial_tension)
            .take(self.trace_len)
            .collect();
        tracing::info!("Session {} reset for scenario {}", self.id, self.persona.key);
    }
}
