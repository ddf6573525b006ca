//! Session configuration with documented defaults
//!
//! Everything tunable about a negotiation session lives here. Values can be
//! overridden from a TOML file; missing keys keep their defaults.

use crate::core::error::{EchoError, Result};
use crate::schedule::ComplicationSchedule;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// What the orchestrator does when the scoring stage cannot score a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringFailurePolicy {
    /// Keep the pre-turn tension and carry on with the turn
    #[default]
    KeepPriorTension,
    /// Treat the failure like any other stage failure and abort the turn
    AbortTurn,
}

/// Configuration for the turn pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoConfig {
    /// Number of most recent history lines shown to the response stage
    ///
    /// Bounded so prompts stay short on long sessions.
    pub history_window: usize,

    /// Deadline for a single oracle call, in milliseconds
    ///
    /// An elapsed deadline counts as an oracle failure for the stage
    /// that issued the call.
    pub oracle_timeout_ms: u64,

    /// Behavior when scoring fails or returns unparseable output
    pub scoring_failure: ScoringFailurePolicy,

    /// Turns on which a complication is requested
    pub schedule: ComplicationSchedule,

    /// Length of the rolling tension trace used by the session report
    pub trace_len: usize,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            history_window: 5,
            oracle_timeout_ms: 30_000,
            scoring_failure: ScoringFailurePolicy::KeepPriorTension,
            schedule: ComplicationSchedule::default(),
            trace_len: 20,
        }
    }
}

impl EchoConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: EchoConfig = toml::from_str(&contents)?;
        config.validate().map_err(EchoError::Config)?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }

    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout_ms = (timeout.as_millis() as u64).max(1);
        self
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.oracle_timeout_ms == 0 {
            return Err("oracle_timeout_ms must be positive".into());
        }

        if self.trace_len == 0 {
            return Err("trace_len must be positive".into());
        }

        Ok(())
    }
}
