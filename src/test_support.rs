//! Fixed-reply oracle for unit tests

use crate::core::error::OracleError;
use crate::core::types::Stage;
use crate::llm::oracle::{Oracle, Prompt};
use std::collections::HashMap;
use std::sync::Mutex;

/// Answers every prompt of a stage with the same scripted reply and counts calls
pub(crate) struct ScriptOracle {
    replies: HashMap<Stage, Result<String, OracleError>>,
    calls: Mutex<HashMap<Stage, usize>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptOracle {
    pub(crate) fn new() -> Self {
        let mut replies = HashMap::new();
        replies.insert(
            Stage::Scoring,
            Ok(r#"{"tension_change": 0, "reasoning": "neutral", "new_tension": 50}"#.to_string()),
        );
        replies.insert(Stage::Complication, Ok("The lights flicker.".to_string()));
        replies.insert(Stage::Response, Ok("Leave me alone!".to_string()));
        Self {
            replies,
            calls: Mutex::new(HashMap::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn reply(mut self, stage: Stage, reply: Result<String, OracleError>) -> Self {
        self.replies.insert(stage, reply);
        self
    }

    pub(crate) fn scoring(self, text: &str) -> Self {
        self.reply(Stage::Scoring, Ok(text.to_string()))
    }

    pub(crate) fn scoring_error(self, error: OracleError) -> Self {
        self.reply(Stage::Scoring, Err(error))
    }

    pub(crate) fn complication(self, text: &str) -> Self {
        self.reply(Stage::Complication, Ok(text.to_string()))
    }

    pub(crate) fn complication_error(self, error: OracleError) -> Self {
        self.reply(Stage::Complication, Err(error))
    }

    pub(crate) fn response(self, text: &str) -> Self {
        self.reply(Stage::Response, Ok(text.to_string()))
    }

    pub(crate) fn response_error(self, error: OracleError) -> Self {
        self.reply(Stage::Response, Err(error))
    }

    pub(crate) fn calls(&self, stage: Stage) -> usize {
        let calls = self.calls.lock().unwrap();
        calls.get(&stage).copied().unwrap_or(0)
    }

    pub(crate) fn prompts(&self, stage: Stage) -> Vec<Prompt> {
        let prompts = self.prompts.lock().unwrap();
        prompts.iter().filter(|p| p.stage == stage).cloned().collect()
    }
}

impl Oracle for ScriptOracle {
    async fn generate(&self, prompt: &Prompt) -> Result<String, OracleError> {
        *self.calls.lock().unwrap().entry(prompt.stage).or_insert(0) += 1;
        self.prompts.lock().unwrap().push(prompt.clone());
        self.replies
            .get(&prompt.stage)
            .cloned()
            .unwrap_or(Err(OracleError::EmptyResponse))
    }
}
