//! Query handlers for the Turn Orchestration context.
//!
//! This module contains query handlers that reconstitute aggregates
//! from stored events and return read-only view DTOs.

use inkwell_core::error::DomainError;
use inkwell_core::repository::EventRepository;
use inkwell_core::story::{CharacterStanding, Choice, GameStatus, ProtagonistStatus};
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers;
use crate::domain::transitions::EndingReason;

/// Read-only view of a game session aggregate.
#[derive(Debug, Serialize)]
pub struct GameSessionView {
    /// The session identifier.
    pub session_id: Uuid,
    /// Session status.
    pub status: GameStatus,
    /// Accepted choices so far.
    pub turn_count: u32,
    /// Current scene setting.
    pub scene_setting: Option<String>,
    /// Every narrative shown, oldest first.
    pub history: Vec<String>,
    /// Choices currently offered.
    pub choices: Vec<Choice>,
    /// Tracked characters.
    pub characters: Vec<CharacterStanding>,
    /// Protagonist status.
    pub protagonist: ProtagonistStatus,
    /// Accumulated plot points.
    pub key_events: Vec<String>,
    /// What ended the story, once ended.
    pub ending_reason: Option<EndingReason>,
    /// Current version (event count).
    pub version: i64,
}

/// Retrieves a game session by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if no events exist for the ID.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_session_by_id(
    session_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<GameSessionView, DomainError> {
    let session = command_handlers::load_session(session_id, repo).await?;
    Ok(GameSessionView {
        session_id,
        status: session.phase().status(),
        turn_count: session.turn_count(),
        scene_setting: session.scene_setting.clone(),
        history: session.history.clone(),
        choices: session.presented_choices.clone(),
        characters: session.characters.clone(),
        protagonist: session.protagonist.clone(),
        key_events: session.key_events.clone(),
        ending_reason: session.ending_reason,
        version: session.version,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use inkwell_core::error::DomainError;
    use inkwell_core::repository::StoredEvent;
    use inkwell_core::story::GameStatus;
    use uuid::Uuid;

    use crate::application::query_handlers::get_session_by_id;
    use crate::domain::events::{GameEnded, GameEventKind, GameStarted};
    use crate::domain::transitions::EndingReason;
    use inkwell_test_support::{EmptyEventRepository, RecordingEventRepository, choice};

    fn stored(session_id: Uuid, sequence_number: i64, kind: &GameEventKind) -> StoredEvent {
        StoredEvent {
            event_id: Uuid::new_v4(),
            aggregate_id: session_id,
            event_type: "game.test".to_owned(),
            payload: serde_json::to_value(kind).unwrap(),
            sequence_number,
            correlation_id: Uuid::new_v4(),
            causation_id: Uuid::new_v4(),
            occurred_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_get_session_by_id_returns_view_with_state() {
        // Arrange
        let session_id = Uuid::new_v4();
        let events = vec![
            stored(
                session_id,
                1,
                &GameEventKind::GameStarted(GameStarted {
                    session_id,
                    narrative: "Robert is dead.".into(),
                    scene_setting: "Ned's chambers".into(),
                    choices: vec![choice("a")],
                    characters: Vec::new(),
                    protagonist: Default::default(),
                    key_events: vec!["Robert died".into()],
                }),
            ),
            stored(
                session_id,
                2,
                &GameEventKind::GameEnded(GameEnded {
                    session_id,
                    status: GameStatus::Defeat,
                    reason: EndingReason::NarrativeSignal,
                }),
            ),
        ];
        let repo = RecordingEventRepository::new(events);

        // Act
        let view = get_session_by_id(session_id, &repo).await.unwrap();

        // Assert
        assert_eq!(view.session_id, session_id);
        assert_eq!(view.status, GameStatus::Defeat);
        assert_eq!(view.turn_count, 0);
        assert_eq!(view.scene_setting.as_deref(), Some("Ned's chambers"));
        assert!(view.choices.is_empty());
        assert_eq!(view.key_events, vec!["Robert died"]);
        assert_eq!(view.ending_reason, Some(EndingReason::NarrativeSignal));
        assert_eq!(view.version, 2);
    }

    #[tokio::test]
    async fn test_get_session_by_id_returns_not_found_when_no_events() {
        // Arrange
        let session_id = Uuid::new_v4();
        let repo = EmptyEventRepository;

        // Act
        let result = get_session_by_id(session_id, &repo).await;

        // Assert
        match result.unwrap_err() {
            DomainError::SessionNotFound(id) => assert_eq!(id, session_id),
            other => panic!("expected SessionNotFound, got {other:?}"),
        }
    }
}
