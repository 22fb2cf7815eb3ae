//! Art description generator backed by the OpenAI chat client.

use async_trait::async_trait;
use inkwell_core::generator::{ArtDescriptionGenerator, ArtDescriptor, ArtRequest, GenerationError};
use tracing::instrument;

use crate::openai::OpenAiClient;
use crate::premise;

/// Describes scenes for the image model.
#[derive(Debug, Clone)]
pub struct OpenAiArtDescriber {
    client: OpenAiClient,
}

impl OpenAiArtDescriber {
    /// Creates a describer on top of `client`.
    #[must_use]
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArtDescriptionGenerator for OpenAiArtDescriber {
    #[instrument(skip(self, request), fields(session_id = %request.session_id))]
    async fn describe(&self, request: &ArtRequest) -> Result<ArtDescriptor, GenerationError> {
        let prompt = premise::art_prompt(&request.scene_setting, &request.narrative);
        let reply = self
            .client
            .chat_json(premise::ART_SYSTEM_PROMPT, &prompt, None)
            .await?;
        parse_descriptor(reply)
    }
}

fn parse_descriptor(reply: serde_json::Value) -> Result<ArtDescriptor, GenerationError> {
    let descriptor: ArtDescriptor = serde_json::from_value(reply)
        .map_err(|e| GenerationError::Malformed(format!("art reply: {e}")))?;
    if descriptor.art_description.trim().is_empty() {
        return Err(GenerationError::Malformed(
            "art reply has an empty description".to_string(),
        ));
    }
    Ok(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_descriptor_defaults_missing_style_notes() {
        let descriptor = parse_descriptor(json!({"art_description": "A torchlit hall."})).unwrap();

        assert_eq!(descriptor.art_description, "A torchlit hall.");
        assert!(descriptor.style_notes.is_empty());
    }

    #[test]
    fn test_parse_descriptor_rejects_blank_or_missing_description() {
        let blank = parse_descriptor(json!({"art_description": "  ", "style_notes": "Dark"}));
        let missing = parse_descriptor(json!({"style_notes": "Dark"}));

        assert!(matches!(blank, Err(GenerationError::Malformed(_))));
        assert!(matches!(missing, Err(GenerationError::Malformed(_))));
    }
}
