//! OpenAI-compatible chat-completions engine.
//!
//! Works against any provider exposing the `/chat/completions` shape
//! (OpenAI, GitHub Models, local gateways). Auth priority: config key →
//! `OPENAI_API_KEY`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::{ParrotError, Result};

use super::Generator;

/// System prompt sent with every query.
const SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Provide clear, concise, and helpful responses.";

/// Request timeout. Generation can be slow; cache hits never get here.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Chat-completions client for OpenAI-compatible providers.
pub struct OpenAiEngine {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl std::fmt::Debug for OpenAiEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEngine")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiEngine {
    /// Build from config, resolving the API key from the config value or the
    /// `OPENAI_API_KEY` environment variable, in that order.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()))
            .ok_or_else(|| {
                ParrotError::Config(
                    "no generation API key: set engine.api_key or OPENAI_API_KEY".into(),
                )
            })?;
        Ok(Self::new_with_key(config, &api_key))
    }

    /// Build with an explicit key. Used by `from_config` and tests.
    pub fn new_with_key(config: &EngineConfig, api_key: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Build the chat-completions request body for a single user query.
    fn build_request_body(&self, query: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": query }
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature
        })
    }

    /// Extract the assistant text from a chat-completions response.
    fn extract_text(response: &Value) -> Option<String> {
        response["choices"][0]["message"]["content"]
            .as_str()
            .map(String::from)
    }

    /// Pull a useful message out of a provider error body, falling back to
    /// the raw text.
    fn extract_error_message(status: u16, body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .map(|msg| format!("provider returned {status}: {msg}"))
            .unwrap_or_else(|| format!("provider returned {status}: {body}"))
    }
}

#[async_trait]
impl Generator for OpenAiEngine {
    async fn generate(&self, query: &str) -> Result<String> {
        debug!(model = %self.model, "Requesting completion");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.build_request_body(query))
            .send()
            .await
            .map_err(|e| ParrotError::Engine(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ParrotError::Engine(Self::extract_error_message(
                status, &body,
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ParrotError::Engine(format!("malformed response body: {e}")))?;

        Self::extract_text(&body)
            .ok_or_else(|| ParrotError::Engine("response contained no message content".into()))
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> OpenAiEngine {
        OpenAiEngine::new_with_key(&EngineConfig::default(), "test-key")
    }

    #[test]
    fn test_request_body_shape() {
        let body = engine().build_request_body("what is go?");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "what is go?");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["temperature"], 0.7);
    }

    #[test]
    fn test_extract_text() {
        let response = json!({
            "choices": [{ "message": { "role": "assistant", "content": "Go is a language." } }]
        });
        assert_eq!(
            OpenAiEngine::extract_text(&response).as_deref(),
            Some("Go is a language.")
        );
    }

    #[test]
    fn test_extract_text_missing_content() {
        assert!(OpenAiEngine::extract_text(&json!({ "choices": [] })).is_none());
    }

    #[test]
    fn test_extract_error_message_from_json_body() {
        let msg = OpenAiEngine::extract_error_message(
            429,
            r#"{"error": {"message": "rate limit exceeded"}}"#,
        );
        assert_eq!(msg, "provider returned 429: rate limit exceeded");
    }

    #[test]
    fn test_extract_error_message_from_opaque_body() {
        let msg = OpenAiEngine::extract_error_message(502, "bad gateway");
        assert_eq!(msg, "provider returned 502: bad gateway");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = EngineConfig {
            base_url: "https://example.test/v1/".into(),
            ..EngineConfig::default()
        };
        let e = OpenAiEngine::new_with_key(&config, "k");
        assert_eq!(e.base_url, "https://example.test/v1");
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", engine());
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("test-key"));
    }
}
