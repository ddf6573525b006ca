//! Response stage: the persona's in-character reply

use crate::core::error::OracleError;
use crate::core::types::{Stage, Tension};
use crate::llm::oracle::{generate_within, Oracle, Prompt};
use crate::persona::PersonaDescriptor;
use std::time::Duration;

/// Generate the persona's reply to `user_text`
///
/// `history_tail` is the already-windowed history from before this turn.
pub async fn respond<O: Oracle>(
    oracle: &O,
    deadline: Duration,
    persona: &PersonaDescriptor,
    tension: Tension,
    complication: &str,
    history_tail: &[String],
    user_text: &str,
) -> Result<String, OracleError> {
    let prompt = response_prompt(persona, tension, complication, history_tail, user_text);
    generate_within(oracle, &prompt, deadline).await
}

pub fn response_prompt(
    persona: &PersonaDescriptor,
    tension: Tension,
    complication: &str,
    history_tail: &[String],
    user_text: &str,
) -> Prompt {
    let system = format!(
        "Roleplay Instructions:\n{}\n\n\
         Respond as the character. Keep it short (1-2 sentences). Act out the emotion.\n\
         Never break character and never mention the tension level.",
        persona.directive
    );

    let history = if history_tail.is_empty() {
        "(conversation just started)".to_string()
    } else {
        history_tail.join("\n")
    };

    let user = format!(
        "Current State:\n- Tension Level: {}/100\n- Complication: {}\n\n\
         Conversation History:\n{}\n\n\
         User just said: \"{}\"",
        tension, complication, history, user_text
    );

    Prompt::new(Stage::Response, system, user)
}
