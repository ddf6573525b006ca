//! Shared stub oracle for integration tests

#![allow(dead_code)]

use echo_crisis::core::error::OracleError;
use echo_crisis::core::types::Stage;
use echo_crisis::llm::{Oracle, Prompt};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub const NEUTRAL_SCORE: &str =
    r#"{"tension_change": 0, "reasoning": "Neutral statement", "new_tension": 50}"#;

/// Stub oracle with a queue of replies per stage
///
/// Queued replies are used first, then the stage default. Every call is
/// counted and its prompt kept.
pub struct StubOracle {
    queued: Mutex<HashMap<Stage, VecDeque<Result<String, OracleError>>>>,
    defaults: HashMap<Stage, Result<String, OracleError>>,
    delays: HashMap<Stage, Duration>,
    prompts: Mutex<Vec<Prompt>>,
}

impl StubOracle {
    pub fn new() -> Self {
        let mut defaults = HashMap::new();
        defaults.insert(Stage::Scoring, Ok(NEUTRAL_SCORE.to_string()));
        defaults.insert(Stage::Complication, Ok("A loud alarm goes off.".to_string()));
        defaults.insert(Stage::Response, Ok("Don't come any closer!".to_string()));
        Self {
            queued: Mutex::new(HashMap::new()),
            defaults,
            delays: HashMap::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Reply with a score record built from `change` and `new_tension`
    pub fn score(self, change: i64, new_tension: i64) -> Self {
        let record = format!(
            r#"{{"tension_change": {}, "reasoning": "scripted", "new_tension": {}}}"#,
            change, new_tension
        );
        self.push(Stage::Scoring, Ok(record))
    }

    pub fn push(self, stage: Stage, reply: Result<String, OracleError>) -> Self {
        self.queued
            .lock()
            .unwrap()
            .entry(stage)
            .or_default()
            .push_back(reply);
        self
    }

    pub fn default_reply(mut self, stage: Stage, reply: Result<String, OracleError>) -> Self {
        self.defaults.insert(stage, reply);
        self
    }

    /// Delay every call of `stage` before answering
    pub fn delay(mut self, stage: Stage, delay: Duration) -> Self {
        self.delays.insert(stage, delay);
        self
    }

    pub fn calls(&self, stage: Stage) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.stage == stage)
            .count()
    }

    pub fn last_prompt(&self, stage: Stage) -> Option<Prompt> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|p| p.stage == stage)
            .cloned()
    }
}

impl Oracle for StubOracle {
    async fn generate(&self, prompt: &Prompt) -> Result<String, OracleError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        if let Some(delay) = self.delays.get(&prompt.stage) {
            tokio::time::sleep(*delay).await;
        }
        let queued = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&prompt.stage)
            .and_then(|q| q.pop_front());
        match queued {
            Some(reply) => reply,
            None => self
                .defaults
                .get(&prompt.stage)
                .cloned()
                .unwrap_or(Err(OracleError::EmptyResponse)),
        }
    }
}
