//! Groq chat-completions provider
//!
//! Speaks the OpenAI-compatible `/chat/completions` wire format against
//! Groq's API. The composed prompt is sent as a single user message; the
//! first choice's message content comes back as the narrative.

use super::{GenerationError, GenerationProvider};
use crate::config::LlmConfig;
use async_trait::async_trait;
use serde_json::json;

pub struct GroqProvider {
    config: LlmConfig,
    client: reqwest::Client,
}

impl GroqProvider {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Resolve the API key from the environment variable named in config
    fn api_key(&self) -> super::Result<String> {
        std::env::var(&self.config.api_key_env).map_err(|_| {
            GenerationError::AuthenticationFailed(format!(
                "environment variable {} is not set",
                self.config.api_key_env
            ))
        })
    }
}

#[async_trait]
impl GenerationProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    async fn generate(&self, prompt: &str) -> super::Result<String> {
        let api_key = self.api_key()?;

        let url = format!("{}/chat/completions", self.config.base_url);

        let payload = json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": prompt,
            }],
            "temperature": self.config.temperature,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(GenerationError::AuthenticationFailed(text));
            } else if status.as_u16() == 429 {
                return Err(GenerationError::RateLimitExceeded);
            } else {
                return Err(GenerationError::InvalidRequest(text));
            }
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenerationError::ParseError(e.to_string()))?;

        let content = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| GenerationError::ParseError("No content in response".to_string()))?;

        if content.is_empty() {
            return Err(GenerationError::ParseError("Empty content".to_string()));
        }

        Ok(content.to_string())
    }
}
