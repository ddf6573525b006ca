//! Async LLM client
//!
//! This is a model-agnostic HTTP client for calling LLM APIs.
//! Supports Anthropic, Google Gemini and OpenAI-compatible APIs (DeepSeek, etc).

use crate::core::error::OracleError;
use crate::llm::oracle::{Oracle, Prompt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// API format type
#[derive(Debug, Clone, PartialEq)]
pub enum ApiFormat {
    Anthropic,
    Gemini,
    OpenAI,
}

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Replies are one or two sentences; the scoring record is a few lines
const MAX_TOKENS: u32 = 1024;

/// Async LLM client for making API calls
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    api_format: ApiFormat,
}

impl LlmClient {
    /// Create a new LLM client with explicit configuration
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        let api_format = Self::detect_api_format(&api_url);
        Self {
            client: Client::new(),
            api_key,
            api_url,
            model,
            api_format,
        }
    }

    /// Detect API format from URL
    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else if url.contains("generativelanguage.googleapis.com") {
            ApiFormat::Gemini
        } else {
            // DeepSeek, OpenAI, and other compatible APIs use OpenAI format
            ApiFormat::OpenAI
        }
    }

    /// Create a client from environment variables
    ///
    /// Required: LLM_API_KEY
    /// Optional: LLM_API_URL (defaults to Anthropic API)
    /// Optional: LLM_MODEL (defaults to claude-3-haiku-20240307)
    pub fn from_env() -> Result<Self, OracleError> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| OracleError::NotConfigured("LLM_API_KEY not set".into()))?;
        let api_url = std::env::var("LLM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());

        Ok(Self::new(api_key, api_url, model))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_format(&self) -> &ApiFormat {
        &self.api_format
    }

    /// Send a completion request to the LLM
    ///
    /// # Arguments
    /// * `system` - System prompt providing context and instructions
    /// * `user` - User message/query to process
    /// * `temperature` - Sampling temperature, provider default if `None`
    ///
    /// # Returns
    /// The LLM's text response
    pub async fn complete(
        &self,
        system: &str,
        user: &str,
        temperature: Option<f32>,
    ) -> Result<String, OracleError> {
        match self.api_format {
            ApiFormat::Anthropic => self.complete_anthropic(system, user, temperature).await,
            ApiFormat::Gemini => self.complete_gemini(system, user, temperature).await,
            ApiFormat::OpenAI => self.complete_openai(system, user, temperature).await,
        }
    }

    async fn complete_anthropic(
        &self,
        system: &str,
        user: &str,
        temperature: Option<f32>,
    ) -> Result<String, OracleError> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: system.into(),
            messages: vec![Message {
                role: "user".into(),
                content: user.into(),
            }],
            temperature,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let completion: AnthropicResponse = Self::read_json(response).await?;

        completion
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or(OracleError::EmptyResponse)
    }

    async fn complete_gemini(
        &self,
        system: &str,
        user: &str,
        temperature: Option<f32>,
    ) -> Result<String, OracleError> {
        let request = GeminiRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: system.into() }],
            },
            contents: vec![GeminiContent {
                role: Some("user".into()),
                parts: vec![GeminiPart { text: user.into() }],
            }],
            generation_config: GeminiGenerationConfig {
                max_output_tokens: MAX_TOKENS,
                temperature,
            },
        };

        // Gemini addresses the model in the path: .../models/{model}:generateContent
        let url = if self.api_url.contains(":generateContent") {
            self.api_url.clone()
        } else {
            format!(
                "{}/models/{}:generateContent",
                self.api_url.trim_end_matches('/'),
                self.model
            )
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let completion: GeminiResponse = Self::read_json(response).await?;

        let text: String = completion
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            Err(OracleError::EmptyResponse)
        } else {
            Ok(text)
        }
    }

    async fn complete_openai(
        &self,
        system: &str,
        user: &str,
        temperature: Option<f32>,
    ) -> Result<String, OracleError> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system.into(),
                },
                Message {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
            temperature,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let completion: OpenAIResponse = Self::read_json(response).await?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(OracleError::EmptyResponse)
    }

    /// Map non-2xx statuses (quota, auth, ...) to `OracleError::Api`
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, OracleError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))
    }
}

impl Oracle for LlmClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, OracleError> {
        tracing::debug!(
            "LLM request: stage={} model={} format={:?}",
            prompt.stage,
            self.model,
            self.api_format
        );
        self.complete(&prompt.system, &prompt.user, prompt.temperature)
            .await
    }
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// Gemini generateContent format
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

// OpenAI-compatible API format (DeepSeek, OpenAI, etc.)
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

// Shared
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}
