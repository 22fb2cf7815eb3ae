//! Domain events for the Turn Orchestration context.

use inkwell_core::event::{DomainEvent, EventMetadata};
use inkwell_core::story::{CharacterStanding, Choice, GameStatus, ProtagonistStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transitions::EndingReason;

/// Emitted when the opening scene of a session is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStarted {
    /// The session that started.
    pub session_id: Uuid,
    /// Opening narrative.
    pub narrative: String,
    /// Opening scene setting.
    pub scene_setting: String,
    /// Choices presented for the first turn.
    pub choices: Vec<Choice>,
    /// Tracked characters.
    pub characters: Vec<CharacterStanding>,
    /// Protagonist status.
    #[serde(default)]
    pub protagonist: ProtagonistStatus,
    /// Initial plot points.
    #[serde(default)]
    pub key_events: Vec<String>,
}

/// Emitted when a choice is accepted and the story moves one turn forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnAdvanced {
    /// The session that advanced.
    pub session_id: Uuid,
    /// The new turn count.
    pub turn_number: u32,
    /// The accepted choice.
    pub choice_id: String,
    /// Narrative of the new turn.
    pub narrative: String,
    /// Scene setting of the new turn.
    pub scene_setting: String,
    /// Choices presented next; empty when the story ends on this turn.
    pub choices: Vec<Choice>,
    /// Character standings after the turn.
    pub characters: Vec<CharacterStanding>,
    /// Protagonist status after the turn.
    #[serde(default)]
    pub protagonist: ProtagonistStatus,
    /// Plot points first recorded on this turn.
    #[serde(default)]
    pub key_events: Vec<String>,
}

/// Emitted when the session reaches victory or defeat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEnded {
    /// The session that ended.
    pub session_id: Uuid,
    /// Terminal status.
    pub status: GameStatus,
    /// What ended the story.
    pub reason: EndingReason,
}

/// Event payload variants for the Turn Orchestration context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GameEventKind {
    /// The opening scene was accepted.
    GameStarted(GameStarted),
    /// A choice was accepted.
    TurnAdvanced(TurnAdvanced),
    /// The story ended.
    GameEnded(GameEnded),
}

/// Domain event envelope for the Turn Orchestration context.
#[derive(Debug, Clone)]
pub struct GameEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: GameEventKind,
}

impl DomainEvent for GameEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            GameEventKind::GameStarted(_) => "game.started",
            GameEventKind::TurnAdvanced(_) => "game.turn_advanced",
            GameEventKind::GameEnded(_) => "game.ended",
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("GameEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
