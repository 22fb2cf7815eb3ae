//! Upstream generator ports.
//!
//! Every external generator is a one-method capability so that production
//! adapters and test doubles are interchangeable. All of them fail with
//! [`GenerationError`]. Whether a failure is fatal is the caller's decision:
//! a narrative failure aborts the turn, an enrichment failure becomes a
//! recorded value.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::story::{CharacterStanding, Choice, ProtagonistStatus};

/// Failure of a single generator call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The upstream service could not be reached.
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete in time.
    #[error("generator timed out: {0}")]
    TimedOut(String),

    /// The upstream answered, but the payload was unusable.
    #[error("malformed generator output: {0}")]
    Malformed(String),

    /// The upstream answered with a non-success status.
    #[error("generator rejected request ({status}): {message}")]
    Rejected {
        /// HTTP status returned by the upstream.
        status: u16,
        /// Upstream error detail.
        message: String,
    },

    /// The generator has no credentials or endpoint configured.
    #[error("generator not configured: {0}")]
    NotConfigured(String),
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

/// The action the player picked on the previous turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChosenAction {
    /// Identifier of the picked choice.
    pub id: String,
    /// Its description, as presented.
    pub description: String,
}

/// Everything the narrative generator gets to see for one turn.
#[derive(Debug, Clone)]
pub struct NarrativeContext {
    /// Session being played.
    pub session_id: Uuid,
    /// Turn being produced; `0` is the opening scene.
    pub turn_number: u32,
    /// Hard turn limit of the game.
    pub max_turns: u32,
    /// Setting of the previous turn, if any.
    pub scene_setting: Option<String>,
    /// Narrative shown on the previous turn, if any.
    pub current_narrative: Option<String>,
    /// Every narrative shown so far, oldest first.
    pub history: Vec<String>,
    /// Tracked characters.
    pub characters: Vec<CharacterStanding>,
    /// Protagonist status.
    pub protagonist: ProtagonistStatus,
    /// Accumulated plot points.
    pub key_events: Vec<String>,
    /// The action taken, absent for the opening scene.
    pub chosen_action: Option<ChosenAction>,
}

impl NarrativeContext {
    /// Whether this context asks for the opening scene.
    #[must_use]
    pub fn is_opening(&self) -> bool {
        self.chosen_action.is_none()
    }
}

/// Raw output of the narrative generator, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NarrativeDraft {
    /// Story text for this turn.
    pub narrative: String,
    /// Short location label.
    pub scene_setting: String,
    /// Choices for the next turn.
    pub choices: Vec<Choice>,
    /// Updated character standings; `None` keeps the previous ones.
    pub characters: Option<Vec<CharacterStanding>>,
    /// Updated protagonist status; `None` keeps the previous one.
    pub protagonist: Option<ProtagonistStatus>,
    /// Plot points to remember.
    pub key_events: Vec<String>,
    /// The story ended.
    pub game_over: bool,
    /// The story ended in the protagonist's favour.
    pub victory: bool,
}

/// Produces the story, one turn at a time. Critical path.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Generates the next turn for `context`.
    async fn generate(&self, context: &NarrativeContext) -> Result<NarrativeDraft, GenerationError>;
}

// ---------------------------------------------------------------------------
// Art, image, voice
// ---------------------------------------------------------------------------

/// Input of the art description generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtRequest {
    /// Session the scene belongs to.
    pub session_id: Uuid,
    /// Location label of the scene.
    pub scene_setting: String,
    /// Narrative of the scene.
    pub narrative: String,
}

/// Visual description of a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtDescriptor {
    /// What the scene looks like.
    pub art_description: String,
    /// Style hints for the image model.
    #[serde(default)]
    pub style_notes: String,
}

impl ArtDescriptor {
    /// Description and style notes joined into one prompt string.
    #[must_use]
    pub fn prompt_text(&self) -> String {
        if self.style_notes.trim().is_empty() {
            self.art_description.clone()
        } else {
            format!("{} {}", self.art_description, self.style_notes)
        }
    }
}

/// Reference to a generated image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// URL or `data:` URL of the image.
    pub image_url: String,
    /// Whether the image came from the semantic cache.
    #[serde(default)]
    pub cached: bool,
}

/// Input of the voice generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceRequest {
    /// Text to speak.
    pub text: String,
    /// Provider voice identifier.
    pub voice_id: String,
}

/// Synthesized audio.
#[derive(Clone, PartialEq, Eq)]
pub struct VoicePayload {
    /// Encoded audio bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub content_type: String,
}

impl std::fmt::Debug for VoicePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoicePayload")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Turns a scene and its narrative into an art description.
#[async_trait]
pub trait ArtDescriptionGenerator: Send + Sync {
    /// Describes the scene in `request`.
    async fn describe(&self, request: &ArtRequest) -> Result<ArtDescriptor, GenerationError>;
}

/// Renders an art description into an image.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generates an image for `art`.
    async fn generate_image(&self, art: &ArtDescriptor) -> Result<GeneratedImage, GenerationError>;
}

/// Speaks narrative text.
#[async_trait]
pub trait VoiceGenerator: Send + Sync {
    /// Synthesizes `request.text` with `request.voice_id`.
    async fn synthesize(&self, request: &VoiceRequest) -> Result<VoicePayload, GenerationError>;
}

/// Maps text to an embedding vector. Used by the semantic image cache.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds `text`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_text_appends_style_notes_when_present() {
        let art = ArtDescriptor {
            art_description: "A torchlit hall.".to_owned(),
            style_notes: "Medieval fantasy".to_owned(),
        };
        let bare = ArtDescriptor {
            art_description: "A torchlit hall.".to_owned(),
            style_notes: "  ".to_owned(),
        };

        assert_eq!(art.prompt_text(), "A torchlit hall. Medieval fantasy");
        assert_eq!(bare.prompt_text(), "A torchlit hall.");
    }

    #[test]
    fn test_voice_payload_debug_hides_bytes() {
        let payload = VoicePayload {
            bytes: vec![0xFF; 2048],
            content_type: "audio/mpeg".to_owned(),
        };

        let rendered = format!("{payload:?}");

        assert!(rendered.contains("len: 2048"));
        assert!(!rendered.contains("255"));
    }
}
