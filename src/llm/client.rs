use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Configuration for talking to a local Ollama instance.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

impl OllamaConfig {
    /// Build from environment variables, falling back to sane local
    /// defaults so the pipeline works out of the box against a default
    /// Ollama install.
    pub fn from_env() -> Self {
        let base_url = std::env::var("OLLAMA_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:11434".to_string());
        let model = std::env::var("MODEL_NAME").unwrap_or_else(|_| "llama3.2:3b".to_string());
        Self { base_url, model }
    }
}

/// A single request/response operation against a large-language-model
/// backend. Abstracted as a trait so the AI attribution and emotion
/// classifier stages can be exercised in tests against a canned
/// implementation instead of a live model.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<serde_json::Value, LlmError>;
}

/// Production client: talks to Ollama's `/api/generate` endpoint, which
/// always wraps its answer as a JSON string under `response` that must be
/// parsed a second time.
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: i64,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, system: &str, user: &str) -> Result<serde_json::Value, LlmError> {
        let request = GenerateRequest {
            model: &self.config.model,
            system,
            prompt: user,
            stream: false,
            format: "json",
            options: GenerateOptions { num_predict: -1 },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::BadStatus { status, body });
        }

        let wrapped: GenerateResponse = response.json().await?;
        let parsed: serde_json::Value = serde_json::from_str(&wrapped.response)?;
        Ok(parsed)
    }
}

/// Deterministic test double. Returns whatever JSON value was configured
/// for it, in order, one per call; panics if exhausted so a miscounted test
/// fails loudly instead of silently falling back to defaults.
pub struct MockLlmClient {
    responses: std::sync::Mutex<std::collections::VecDeque<serde_json::Value>>,
}

impl MockLlmClient {
    pub fn new(responses: Vec<serde_json::Value>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, _system: &str, _user: &str) -> Result<serde_json::Value, LlmError> {
        let mut responses = self.responses.lock().unwrap();
        Ok(responses
            .pop_front()
            .expect("MockLlmClient called more times than responses were configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_client_returns_canned_responses_in_order() {
        let client = MockLlmClient::new(vec![
            serde_json::json!({"a": 1}),
            serde_json::json!({"a": 2}),
        ]);
        assert_eq!(client.generate("s", "u").await.unwrap(), serde_json::json!({"a": 1}));
        assert_eq!(client.generate("s", "u").await.unwrap(), serde_json::json!({"a": 2}));
    }

    #[test]
    fn ollama_config_defaults_when_env_unset() {
        std::env::remove_var("OLLAMA_BASE_URL");
        std::env::remove_var("MODEL_NAME");
        let config = OllamaConfig::from_env();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model, "llama3.2:3b");
    }
}
