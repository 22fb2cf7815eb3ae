//! ElevenLabs text-to-speech client.

use std::time::Duration;

use async_trait::async_trait;
use inkwell_core::generator::{GenerationError, VoiceGenerator, VoicePayload, VoiceRequest};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::{ensure_success, transport_error};

/// Default ElevenLabs API base URL.
pub const DEFAULT_ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";

/// Stock narrator voice.
pub const DEFAULT_VOICE_ID: &str = "JBFqnCBsd6RMkjVDRZzb";

/// Low-latency speech model.
pub const DEFAULT_VOICE_MODEL: &str = "eleven_flash_v2_5";

/// MP3, 44.1 kHz, 128 kbps.
pub const OUTPUT_FORMAT: &str = "mp3_44100_128";

/// Default request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const SERVICE: &str = "elevenlabs";

/// Client for ElevenLabs' text-to-speech endpoint.
///
/// Without an API key every call fails with `GenerationError::NotConfigured`.
#[derive(Clone)]
pub struct ElevenLabsVoiceGenerator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model_id: String,
}

impl std::fmt::Debug for ElevenLabsVoiceGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsVoiceGenerator")
            .field("base_url", &self.base_url)
            .field("model_id", &self.model_id)
            .field("configured", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl ElevenLabsVoiceGenerator {
    /// Creates a client. A `None` key disables voice synthesis.
    #[must_use]
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model_id: DEFAULT_VOICE_MODEL.to_string(),
        }
    }

    fn speech_url(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{voice_id}?output_format={OUTPUT_FORMAT}",
            self.base_url
        )
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

#[async_trait]
impl VoiceGenerator for ElevenLabsVoiceGenerator {
    #[instrument(skip(self, request), fields(voice_id = %request.voice_id))]
    async fn synthesize(&self, request: &VoiceRequest) -> Result<VoicePayload, GenerationError> {
        let Some(api_key) = &self.api_key else {
            return Err(GenerationError::NotConfigured(
                "ELEVENLABS_API_KEY is not set".to_string(),
            ));
        };
        if request.voice_id.trim().is_empty() {
            return Err(GenerationError::NotConfigured("empty voice id".to_string()));
        }

        let response = self
            .client
            .post(self.speech_url(&request.voice_id))
            .header("xi-api-key", api_key)
            .json(&SpeechRequest {
                text: &request.text,
                model_id: &self.model_id,
            })
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;
        let response = ensure_success(SERVICE, response).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(SERVICE, &e))?;
        debug!(len = bytes.len(), "voice synthesized");

        Ok(VoicePayload {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_url_carries_voice_and_output_format() {
        let generator = ElevenLabsVoiceGenerator::new("https://api.elevenlabs.io/", None);

        assert_eq!(
            generator.speech_url("voice-1"),
            "https://api.elevenlabs.io/v1/text-to-speech/voice-1?output_format=mp3_44100_128"
        );
    }

    #[tokio::test]
    async fn test_synthesize_without_key_is_not_configured() {
        // Arrange
        let generator = ElevenLabsVoiceGenerator::new(DEFAULT_ELEVENLABS_BASE_URL, Some(" ".into()));
        let request = VoiceRequest {
            text: "Winter is coming.".to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
        };

        // Act
        let result = generator.synthesize(&request).await;

        // Assert
        assert!(matches!(result, Err(GenerationError::NotConfigured(_))));
    }
}
