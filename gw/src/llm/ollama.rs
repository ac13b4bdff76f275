//! Ollama chat API client
//!
//! Non-streaming `POST /api/chat`; the kiosk wants whole utterances for the
//! synthesizer, not tokens.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{ChatMessage, LlmError, Responder};
use crate::config::LlmConfig;

/// Local Ollama endpoint client
pub struct OllamaClient {
    base_url: String,
    model: String,
    http: Client,
}

impl OllamaClient {
    /// Create a new client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            http,
        })
    }

    fn build_request_body(&self, history: &[ChatMessage]) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": history,
            "stream": false,
        })
    }
}

/// Response shape of `/api/chat`
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

#[async_trait]
impl Responder for OllamaClient {
    async fn respond(&self, history: &[ChatMessage]) -> Result<String, LlmError> {
        debug!(model = %self.model, turns = history.len(), "respond: calling Ollama");

        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&self.build_request_body(history))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let reply = parsed.message.content.trim().to_string();
        if reply.is_empty() {
            return Err(LlmError::InvalidResponse("empty completion".to_string()));
        }

        debug!(chars = reply.len(), "respond: got reply");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let client = OllamaClient::from_config(&LlmConfig::default()).unwrap();
        let history = vec![
            ChatMessage::system("You are a plant wall."),
            ChatMessage::user("how are you?"),
        ];

        let body = client.build_request_body(&history);
        assert_eq!(body["model"], "gemma2:2b");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "how are you?");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = LlmConfig {
            base_url: "http://localhost:11434/".to_string(),
            ..Default::default()
        };
        let client = OllamaClient::from_config(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_response_shape_parses() {
        let raw = r#"{"model":"gemma2:2b","message":{"role":"assistant","content":"I feel leafy."},"done":true}"#;
        let parsed: OllamaChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.message.content, "I feel leafy.");
    }
}
