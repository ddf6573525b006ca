//! Offline oracle
//!
//! Lets a session run without an API key. Scoring follows the same rules
//! the model is given, using keyword matching; complications and replies
//! are drawn from canned lines with a seedable RNG so runs are reproducible.

use crate::core::error::OracleError;
use crate::core::types::{Stage, Tension};
use crate::llm::oracle::{Oracle, Prompt};
use crate::pipeline::ScoreRecord;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Mutex;

const AGGRESSIVE_MARKERS: &[&str] = &[
    "shut up", "stupid", "idiot", "or else", "ridiculous", "pathetic", "i don't care",
    "whatever", "get over it",
];

const COMMAND_MARKERS: &[&str] = &[
    "calm down", "stop", "sit down", "be quiet", "listen to me", "you need to", "you have to",
    "you must", "relax",
];

const VALIDATING_MARKERS: &[&str] = &[
    "i understand", "i hear you", "i can see", "that sounds", "must be", "you're safe",
    "it's okay", "i'm sorry", "take your time", "makes sense", "i'm here",
];

const MINOR_COMPLICATIONS: &[&str] = &[
    "A loud alarm goes off.",
    "The lights flicker.",
    "A phone starts ringing nearby and won't stop.",
];

const MAJOR_COMPLICATIONS: &[&str] = &[
    "Another staff member walks in and yells.",
    "Security arrives and starts shouting orders.",
    "A crowd gathers and someone starts filming.",
];

const HIGH_TENSION_REPLIES: &[&str] = &[
    "No! Stay back! Don't come any closer!",
    "You're not listening to me! Nobody ever listens!",
    "Get away from me right now!",
];

const MID_TENSION_REPLIES: &[&str] = &[
    "I... I don't know. How do I know I can trust you?",
    "Maybe. But you have to promise me this is real.",
    "Okay, I'm listening. Just don't lie to me.",
];

const LOW_TENSION_REPLIES: &[&str] = &[
    "Okay. Thank you for actually hearing me.",
    "I think I can breathe a little now.",
    "Alright. What happens next?",
];

pub struct ScriptedOracle {
    rng: Mutex<ChaCha8Rng>,
}

impl ScriptedOracle {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    fn pick(&self, lines: &[&str]) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        lines.choose(&mut *rng).copied().unwrap_or("...").to_string()
    }

    fn score(&self, prompt: &Prompt) -> Result<String, OracleError> {
        let current = field_number(&prompt.user, "Current Tension:").unwrap_or(50);
        let text = quoted_after(&prompt.user, "User Input:").unwrap_or_default();
        let (change, reasoning) = classify(&text);

        let record = ScoreRecord {
            tension_change: change,
            reasoning: reasoning.to_string(),
            new_tension: Tension::clamped(current + change).value() as i64,
        };
        serde_json::to_string(&record).map_err(|e| OracleError::Transport(e.to_string()))
    }

    fn complicate(&self, prompt: &Prompt) -> String {
        if prompt.user.contains("a major complication") {
            self.pick(MAJOR_COMPLICATIONS)
        } else {
            self.pick(MINOR_COMPLICATIONS)
        }
    }

    fn reply(&self, prompt: &Prompt) -> String {
        let tension = field_number(&prompt.user, "Tension Level:").unwrap_or(50);
        let lines = if tension > 70 {
            HIGH_TENSION_REPLIES
        } else if tension > 30 {
            MID_TENSION_REPLIES
        } else {
            LOW_TENSION_REPLIES
        };
        self.pick(lines)
    }
}

impl Oracle for ScriptedOracle {
    async fn generate(&self, prompt: &Prompt) -> Result<String, OracleError> {
        match prompt.stage {
            Stage::Scoring => self.score(prompt),
            Stage::Complication => Ok(self.complicate(prompt)),
            Stage::Response => Ok(self.reply(prompt)),
        }
    }
}

/// Tension change and reasoning for a trainee message
fn classify(text: &str) -> (i64, &'static str) {
    let lower = text.to_lowercase();
    let has = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    if has(AGGRESSIVE_MARKERS) {
        (20, "Aggressive language")
    } else if has(COMMAND_MARKERS) {
        (15, "Gives orders instead of listening")
    } else if has(VALIDATING_MARKERS) {
        (-10, "Validates feelings")
    } else {
        (0, "Neutral statement")
    }
}

/// Integer following `label` on the same line, e.g. "Tension Level: 80/100"
fn field_number(text: &str, label: &str) -> Option<i64> {
    let rest = &text[text.find(label)? + label.len()..];
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    digits.parse().ok()
}

/// Double-quoted text following `label`
fn quoted_after(text: &str, label: &str) -> Option<String> {
    let rest = &text[text.find(label)? + label.len()..];
    let start = rest.find('"')? + 1;
    let end = rest.rfind('"')?;
    (end >= start).then(|| rest[start..end].to_string())
}
