//! Text-generation oracle seam
//!
//! Every pipeline stage talks to the model through the [`Oracle`] trait.
//! The HTTP client, the offline scripted oracle and test stubs all
//! implement it.

use crate::core::error::OracleError;
use crate::core::types::Stage;
use crate::llm::parser::parse_structured;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// A single generation request
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    /// Stage issuing the request
    pub stage: Stage,
    /// Instructions and rules for the model
    pub system: String,
    /// Per-turn content
    pub user: String,
    /// Sampling temperature, provider default when unset
    pub temperature: Option<f32>,
}

impl Prompt {
    pub fn new(stage: Stage, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            stage,
            system: system.into(),
            user: user.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// External text-generation service
#[allow(async_fn_in_trait)]
pub trait Oracle {
    /// Generate free text for a prompt
    async fn generate(&self, prompt: &Prompt) -> Result<String, OracleError>;
}

impl<O: Oracle> Oracle for &O {
    async fn generate(&self, prompt: &Prompt) -> Result<String, OracleError> {
        (**self).generate(prompt).await
    }
}

/// Generate with a deadline
///
/// An elapsed deadline drops the in-flight call and reports
/// [`OracleError::Timeout`].
pub async fn generate_within<O: Oracle>(
    oracle: &O,
    prompt: &Prompt,
    deadline: Duration,
) -> Result<String, OracleError> {
    match tokio::time::timeout(deadline, oracle.generate(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(OracleError::Timeout(deadline)),
    }
}

/// Generate with a deadline and deserialize the response as `T`
pub async fn generate_structured<T: DeserializeOwned, O: Oracle>(
    oracle: &O,
    prompt: &Prompt,
    deadline: Duration,
) -> Result<T, OracleError> {
    let response = generate_within(oracle, prompt, deadline).await?;
    Ok(parse_structured(&response)?)
}
