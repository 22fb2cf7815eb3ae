//! OpenAI client (chat completions in JSON mode, embeddings).

use std::time::Duration;

use async_trait::async_trait;
use inkwell_core::generator::{EmbeddingProvider, GenerationError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ensure_success, transport_error};

/// Default OpenAI base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-5-nano";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const SERVICE: &str = "openai";

/// Client for OpenAI's chat completion and embedding endpoints.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    embedding_model: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    /// Creates a client with the default models and timeout.
    #[must_use]
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom request timeout.
    #[must_use]
    pub fn with_timeout(base_url: &str, api_key: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    /// Overrides the chat model.
    #[must_use]
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Overrides the embedding model.
    #[must_use]
    pub fn with_embedding_model(mut self, model: &str) -> Self {
        self.embedding_model = model.to_string();
        self
    }

    /// The chat model in use.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Runs a chat completion in JSON mode and parses the reply.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::TimedOut` or `Unavailable` on transport
    /// failures, `Rejected` on a non-success status and `Malformed` when the
    /// reply is not a JSON object.
    pub async fn chat_json(
        &self,
        system: &str,
        user: &str,
        temperature: Option<f32>,
    ) -> Result<serde_json::Value, GenerationError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(system.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(user.to_string()),
                },
            ],
            response_format: ResponseFormat {
                r#type: "json_object".to_string(),
            },
            temperature,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;
        let response = ensure_success(SERVICE, response).await?;

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(format!("{SERVICE}: {e}")))?;

        parse_json_reply(api_response)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, GenerationError> {
        let request = EmbeddingRequest {
            model: self.embedding_model.clone(),
            input: text.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;
        let response = ensure_success(SERVICE, response).await?;

        let api_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(format!("{SERVICE}: {e}")))?;

        let embedding = api_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| GenerationError::Malformed("no embedding in response".to_string()))?;
        debug!(dimensions = embedding.len(), "embedding received");
        Ok(embedding)
    }
}

fn parse_json_reply(response: ChatResponse) -> Result<serde_json::Value, GenerationError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| GenerationError::Malformed("no content in chat response".to_string()))?;

    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| GenerationError::Malformed(format!("reply is not JSON: {e}")))?;
    if !value.is_object() {
        return Err(GenerationError::Malformed(
            "reply is not a JSON object".to_string(),
        ));
    }
    Ok(value)
}

// =============================================================================
// OpenAI API types
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(content: Option<&str>) -> ChatResponse {
        ChatResponse {
            choices: vec![ChatChoice {
                message: ChatMessage {
                    role: "assistant".to_string(),
                    content: content.map(str::to_string),
                },
            }],
        }
    }

    #[test]
    fn test_parse_json_reply_returns_object() {
        let value = parse_json_reply(reply(Some(r#"{"narrative": "Dawn breaks."}"#))).unwrap();

        assert_eq!(value["narrative"], "Dawn breaks.");
    }

    #[test]
    fn test_parse_json_reply_rejects_prose_and_non_objects() {
        let prose = parse_json_reply(reply(Some("Once upon a time")));
        let array = parse_json_reply(reply(Some("[1, 2]")));
        let empty = parse_json_reply(reply(None));

        assert!(matches!(prose, Err(GenerationError::Malformed(_))));
        assert!(matches!(array, Err(GenerationError::Malformed(_))));
        assert!(matches!(empty, Err(GenerationError::Malformed(_))));
    }

    #[test]
    fn test_chat_request_serializes_json_mode_and_skips_missing_temperature() {
        // Arrange
        let request = ChatRequest {
            model: DEFAULT_CHAT_MODEL.to_string(),
            messages: Vec::new(),
            response_format: ResponseFormat {
                r#type: "json_object".to_string(),
            },
            temperature: None,
        };

        // Act
        let json = serde_json::to_value(&request).unwrap();

        // Assert
        assert_eq!(json["response_format"]["type"], "json_object");
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_client_trims_trailing_slash_and_debug_hides_key() {
        let client = OpenAiClient::new("https://api.openai.com/", "sk-secret")
            .with_model("gpt-test");

        let rendered = format!("{client:?}");

        assert_eq!(client.base_url, "https://api.openai.com");
        assert_eq!(client.model(), "gpt-test");
        assert!(!rendered.contains("sk-secret"));
    }
}
