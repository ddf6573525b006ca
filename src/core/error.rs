use crate::core::types::Stage;
use std::time::Duration;
use thiserror::Error;

/// Structured oracle output did not match the requested schema
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{reason} - Response: {raw}")]
pub struct ParseError {
    pub reason: String,
    pub raw: String,
}

impl ParseError {
    pub fn new(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            raw: raw.into(),
        }
    }
}

/// Failure of a single generation call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Empty response")]
    EmptyResponse,

    #[error("Oracle call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Oracle not configured: {0}")]
    NotConfigured(String),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Turn-level failure surfaced to the caller
///
/// When a turn fails the caller's pre-turn state stays authoritative.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: OracleError,
    },

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("User input is empty")]
    EmptyInput,

    #[error("Invalid session state: {0}")]
    InvalidState(String),
}

impl SimulationError {
    pub fn stage(stage: Stage, source: OracleError) -> Self {
        Self::Stage { stage, source }
    }

    /// Stage that caused the failure, if any
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            SimulationError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Application-level error for configuration loading and the runner
#[derive(Error, Debug)]
pub enum EchoError {
    #[error("Simulation error: {0}")]
    Simulation(#[from] SimulationError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EchoError>;
