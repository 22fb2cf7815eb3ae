//! Command handlers for the Turn Orchestration context.
//!
//! Each handler loads the session, asks the narrative generator for the next
//! scene, applies the state machine, and persists the resulting events. A
//! failure anywhere before the append leaves the stored session untouched.

use std::sync::Arc;

use inkwell_core::aggregate::AggregateRoot;
use inkwell_core::clock::Clock;
use inkwell_core::command::Command;
use inkwell_core::error::DomainError;
use inkwell_core::event::EventMetadata;
use inkwell_core::generator::{
    GenerationError, NarrativeContext, NarrativeDraft, NarrativeGenerator,
};
use inkwell_core::repository::{EventRepository, StoredEvent};
use inkwell_enrichment::isolation::isolate;
use tracing::warn;
use uuid::Uuid;

use crate::domain::aggregates::GameSession;
use crate::domain::commands::{ContinueGame, StartGame};
use crate::domain::events::{GameEvent, GameEventKind};
use crate::domain::transitions::TurnResult;

fn upstream(command: &dyn Command, error: &GenerationError) -> DomainError {
    warn!(
        command_type = command.command_type(),
        session_id = %command.session_id(),
        correlation_id = %command.correlation_id(),
        %error,
        "narrative generation failed"
    );
    DomainError::UpstreamNarrative(error.to_string())
}

/// Runs the narrative call in its own task so a panicking generator fails
/// the turn instead of the request.
async fn generate(
    command: &dyn Command,
    narrator: Arc<dyn NarrativeGenerator>,
    context: NarrativeContext,
) -> Result<NarrativeDraft, DomainError> {
    isolate("narrative", None, async move { narrator.generate(&context).await })
        .await
        .map_err(|e| upstream(command, &e))
}

/// Reconstitutes a `GameSession` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub(crate) fn reconstitute(
    session_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<GameSession, DomainError> {
    let mut session = GameSession::new(session_id);
    for stored in existing_events {
        let kind: GameEventKind = serde_json::from_value(stored.payload.clone()).map_err(|e| {
            DomainError::Infrastructure(format!("event deserialization failed: {e}"))
        })?;
        let event = GameEvent {
            metadata: EventMetadata::from(stored),
            kind,
        };
        session.apply(&event);
    }
    Ok(session)
}

/// Loads an existing session.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound` if no events exist for the ID, or
/// the repository's error.
pub(crate) async fn load_session(
    session_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<GameSession, DomainError> {
    let stored_events = repo.load_events(session_id).await?;
    if stored_events.is_empty() {
        return Err(DomainError::SessionNotFound(session_id));
    }
    reconstitute(session_id, &stored_events)
}

async fn persist(session: &GameSession, repo: &dyn EventRepository) -> Result<(), DomainError> {
    repo.append_events(session.id, session.version(), &session.pending_rows())
        .await
}

/// Handles the `StartGame` command: generates the opening scene and
/// persists the new session.
///
/// # Errors
///
/// Returns `DomainError::UpstreamNarrative` if generation fails or panics or
/// the draft is malformed, and the repository's error if appending fails.
pub async fn handle_start_game(
    command: &StartGame,
    narrator: Arc<dyn NarrativeGenerator>,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<TurnResult, DomainError> {
    let mut session = GameSession::new(command.session_id);

    let draft = generate(command, narrator, session.opening_context()).await?;

    let result = session.start(draft, command.correlation_id, clock)?;
    persist(&session, repo).await?;

    Ok(result)
}

/// Handles the `ContinueGame` command: validates the choice, generates the
/// next scene, and persists the turn.
///
/// # Errors
///
/// Returns `DomainError::SessionNotFound`, `DomainError::SessionTerminated`
/// or `DomainError::InvalidChoice` before calling the generator;
/// `DomainError::UpstreamNarrative` if generation fails; and the
/// repository's error (including `ConcurrencyConflict`) if appending fails.
pub async fn handle_continue_game(
    command: &ContinueGame,
    narrator: Arc<dyn NarrativeGenerator>,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<TurnResult, DomainError> {
    let mut session = load_session(command.session_id, repo).await?;

    let chosen = session.ensure_can_advance(&command.choice_id)?.clone();
    let draft = generate(command, narrator, session.next_context(&chosen)).await?;

    let result = session.advance(&command.choice_id, draft, command.correlation_id, clock)?;
    persist(&session, repo).await?;

    Ok(result)
}
