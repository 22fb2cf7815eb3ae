//! Narrative generator backed by the OpenAI chat client.

use async_trait::async_trait;
use inkwell_core::generator::{
    GenerationError, NarrativeContext, NarrativeDraft, NarrativeGenerator,
};
use inkwell_core::story::{
    CharacterStanding, Choice, MAX_TRUST_LEVEL, ProtagonistStatus, ThreatLevel,
};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::openai::OpenAiClient;
use crate::premise;

/// Writes each turn of the story through a chat completion.
#[derive(Debug, Clone)]
pub struct OpenAiNarrativeGenerator {
    client: OpenAiClient,
}

impl OpenAiNarrativeGenerator {
    /// Creates a generator on top of `client`.
    #[must_use]
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NarrativeGenerator for OpenAiNarrativeGenerator {
    #[instrument(skip(self, context), fields(session_id = %context.session_id, turn_number = context.turn_number))]
    async fn generate(&self, context: &NarrativeContext) -> Result<NarrativeDraft, GenerationError> {
        let (prompt, temperature) = if context.is_opening() {
            (premise::opening_prompt(), Some(premise::OPENING_TEMPERATURE))
        } else {
            (premise::continuation_prompt(context), None)
        };

        let reply = self
            .client
            .chat_json(premise::NARRATIVE_SYSTEM_PROMPT, &prompt, temperature)
            .await?;
        debug!("narrative reply received");

        parse_draft(reply, context)
    }
}

/// A narrative reply as the model writes it.
#[derive(Debug, Deserialize)]
struct WireDraft {
    #[serde(default)]
    narrative: String,
    #[serde(default)]
    scene_setting: String,
    #[serde(default)]
    choices: Option<Vec<Choice>>,
    #[serde(default)]
    characters: Option<Vec<WireCharacter>>,
    #[serde(default)]
    ned_status: Option<ProtagonistStatus>,
    #[serde(default)]
    key_events: Vec<String>,
    #[serde(default)]
    game_over: bool,
    #[serde(default)]
    victory: bool,
}

/// Models write trust outside `0..=10`, or as a fraction, now and then; it
/// is rounded and clamped on the way in.
#[derive(Debug, Deserialize)]
struct WireCharacter {
    name: String,
    #[serde(default)]
    trust_level: f64,
    #[serde(default)]
    threat_level: ThreatLevel,
}

impl WireCharacter {
    #[allow(clippy::cast_possible_truncation)]
    fn into_standing(self) -> CharacterStanding {
        let trust = if self.trust_level.is_finite() {
            self.trust_level
                .round()
                .clamp(0.0, f64::from(MAX_TRUST_LEVEL)) as i64
        } else {
            0
        };
        CharacterStanding::new(self.name, trust, self.threat_level)
    }
}

fn parse_draft(
    reply: serde_json::Value,
    context: &NarrativeContext,
) -> Result<NarrativeDraft, GenerationError> {
    let wire: WireDraft = serde_json::from_value(reply)
        .map_err(|e| GenerationError::Malformed(format!("narrative reply: {e}")))?;

    let mut characters = wire.characters.map(|cast| {
        cast.into_iter()
            .map(WireCharacter::into_standing)
            .collect::<Vec<_>>()
    });
    let mut protagonist = wire.ned_status;
    if context.is_opening() {
        characters = characters
            .filter(|cast| !cast.is_empty())
            .or_else(|| Some(premise::default_characters()));
        protagonist = protagonist.or_else(|| Some(premise::default_protagonist()));
    }

    let terminal = wire.game_over || wire.victory;
    let mut choices = wire.choices.unwrap_or_default();
    if !terminal && choices.is_empty() && !context.is_opening() {
        choices = premise::fallback_choices(context.turn_number);
    }

    Ok(NarrativeDraft {
        narrative: wire.narrative,
        scene_setting: wire.scene_setting,
        choices,
        characters,
        protagonist,
        key_events: wire.key_events,
        game_over: wire.game_over,
        victory: wire.victory,
    })
}
