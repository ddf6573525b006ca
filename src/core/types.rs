//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a negotiation session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Turn counter (one user utterance -> persona reply cycle)
pub type TurnNumber = u32;

/// Heart rate of the persona at rest, before tension is added
pub const RESTING_HEART_RATE: u16 = 60;

/// Upper bound of the tension scale
pub const MAX_TENSION: u8 = 100;

/// Persona distress level, always within 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Tension(u8);

impl Tension {
    pub const CALM: Tension = Tension(0);
    pub const MAX: Tension = Tension(MAX_TENSION);

    /// Saturate an arbitrary value into range
    ///
    /// Used for values coming back from the oracle, which is not trusted
    /// to respect the scale.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, MAX_TENSION as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Heart rate derived from this tension
    pub fn heart_rate(self) -> HeartRate {
        HeartRate(RESTING_HEART_RATE + self.0 as u16)
    }
}

impl TryFrom<i64> for Tension {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (0..=MAX_TENSION as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(format!("tension {} outside 0..={}", value, MAX_TENSION))
        }
    }
}

impl From<Tension> for i64 {
    fn from(tension: Tension) -> Self {
        tension.0 as i64
    }
}

impl fmt::Display for Tension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Beats per minute, derived from tension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HeartRate(pub u16);

impl fmt::Display for HeartRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.0)
    }
}

/// Pipeline stage, used to tag prompts and attribute failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Scoring,
    Complication,
    Response,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Scoring => "scoring",
            Stage::Complication => "complication",
            Stage::Response => "response",
        };
        f.write_str(name)
    }
}

/// Identifies a persona in the catalog ("ER", "School", ...)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioKey(pub String);

impl ScenarioKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScenarioKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who said a line of the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Actor,
}

impl Speaker {
    /// Prefix used when the line is rendered into a prompt
    pub fn label(self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Actor => "AI",
        }
    }
}

/// One line of conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub speaker: Speaker,
    pub text: String,
}

impl HistoryEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn actor(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Actor,
            text: text.into(),
        }
    }

    /// Parse a rendered `"User: ..."` / `"AI: ..."` line
    ///
    /// Only the single separator space written by `Display` is removed, so
    /// rendering and parsing round-trip exactly.
    pub fn parse_line(line: &str) -> Option<Self> {
        let body = |text: &str| text.strip_prefix(' ').unwrap_or(text).to_string();
        if let Some(text) = line.strip_prefix("User:") {
            Some(Self::user(body(text)))
        } else {
            line.strip_prefix("AI:").map(|text| Self::actor(body(text)))
        }
    }
}

impl fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.speaker.label(), self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tension_clamped() {
        assert_eq!(Tension::clamped(-25).value(), 0);
        assert_eq!(Tension::clamped(42).value(), 42);
        assert_eq!(Tension::clamped(250).value(), 100);
    }

    #[test]
    fn test_tension_try_from_rejects_out_of_range() {
        assert!(Tension::try_from(101).is_err());
        assert!(Tension::try_from(-1).is_err());
        assert_eq!(Tension::try_from(100).unwrap(), Tension::MAX);
    }

    #[test]
    fn test_heart_rate_derived() {
        assert_eq!(Tension::clamped(80).heart_rate(), HeartRate(140));
        assert_eq!(Tension::CALM.heart_rate(), HeartRate(60));
    }

    #[test]
    fn test_tension_deserialize_validates() {
        let ok: Tension = serde_json::from_str("55").unwrap();
        assert_eq!(ok.value(), 55);
        assert!(serde_json::from_str::<Tension>("140").is_err());
    }

    #[test]
    fn test_history_entry_rendering() {
        assert_eq!(HistoryEntry::user("hello").to_string(), "User: hello");
        assert_eq!(HistoryEntry::actor("go away").to_string(), "AI: go away");
    }

    #[test]
    fn test_history_entry_parse_line() {
        let entry = HistoryEntry::parse_line("AI: leave me alone").unwrap();
        assert_eq!(entry.speaker, Speaker::Actor);
        assert_eq!(entry.text, "leave me alone");

        assert!(HistoryEntry::parse_line("Narrator: lights flicker").is_none());
    }

    #[test]
    fn test_history_entry_keeps_inner_whitespace() {
        let entry = HistoryEntry::parse_line("AI:   ...no.").unwrap();
        assert_eq!(entry.text, "  ...no.");

        let reply = HistoryEntry::actor("  (sobbing) go away ");
        assert_eq!(HistoryEntry::parse_line(&reply.to_string()), Some(reply));
        assert_eq!(HistoryEntry::parse_line("User:").unwrap().text, "");
    }
}
