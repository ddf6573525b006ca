//! Complication schedule
//!
//! Maps turn numbers to complication severity. The mapping is a pure
//! function of the turn number; turns missing from the table never reach
//! the oracle.

use crate::core::types::TurnNumber;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How disruptive an injected complication should be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Minor,
    Major,
}

impl Severity {
    pub fn is_none(self) -> bool {
        matches!(self, Severity::None)
    }

    pub fn describe(self) -> &'static str {
        match self {
            Severity::None => "no",
            Severity::Minor => "a minor",
            Severity::Major => "a major",
        }
    }
}

/// Checkpoint table: turn number -> severity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Severity>", into = "BTreeMap<String, Severity>")]
pub struct ComplicationSchedule {
    checkpoints: BTreeMap<TurnNumber, Severity>,
}

impl Default for ComplicationSchedule {
    fn default() -> Self {
        Self::from_checkpoints([(3, Severity::Minor), (6, Severity::Major)])
    }
}

impl ComplicationSchedule {
    /// Schedule that never injects anything
    pub fn empty() -> Self {
        Self {
            checkpoints: BTreeMap::new(),
        }
    }

    pub fn from_checkpoints(checkpoints: impl IntoIterator<Item = (TurnNumber, Severity)>) -> Self {
        Self {
            checkpoints: checkpoints
                .into_iter()
                .filter(|(_, severity)| !severity.is_none())
                .collect(),
        }
    }

    /// Severity for a (1-based) turn number
    pub fn severity_for(&self, turn: TurnNumber) -> Severity {
        self.checkpoints
            .get(&turn)
            .copied()
            .unwrap_or(Severity::None)
    }

    pub fn is_checkpoint(&self, turn: TurnNumber) -> bool {
        !self.severity_for(turn).is_none()
    }

    pub fn checkpoints(&self) -> impl Iterator<Item = (TurnNumber, Severity)> + '_ {
        self.checkpoints.iter().map(|(turn, severity)| (*turn, *severity))
    }
}

// TOML tables only allow string keys, so the table is keyed by "3", "6", ...
impl TryFrom<BTreeMap<String, Severity>> for ComplicationSchedule {
    type Error = String;

    fn try_from(raw: BTreeMap<String, Severity>) -> Result<Self, Self::Error> {
        let mut checkpoints = Vec::with_capacity(raw.len());
        for (key, severity) in raw {
            let turn: TurnNumber = key
                .trim()
                .parse()
                .map_err(|_| format!("Invalid checkpoint turn: {}", key))?;
            if turn == 0 {
                return Err("Checkpoint turns start at 1".into());
            }
            checkpoints.push((turn, severity));
        }
        Ok(Self::from_checkpoints(checkpoints))
    }
}

impl From<ComplicationSchedule> for BTreeMap<String, Severity> {
    fn from(schedule: ComplicationSchedule) -> Self {
        schedule
            .checkpoints
            .into_iter()
            .map(|(turn, severity)| (turn.to_string(), severity))
            .collect()
    }
}
