//! Turn orchestrator.
//!
//! Sequences one turn: the narrative generator and the state transition run
//! on the critical path and decide the response; enrichment is launched
//! afterwards and handed back untouched.

use std::fmt;
use std::sync::Arc;

use inkwell_core::clock::Clock;
use inkwell_core::error::DomainError;
use inkwell_core::generator::NarrativeGenerator;
use inkwell_core::repository::EventRepository;
use inkwell_enrichment::pipeline::{EnrichmentHandle, EnrichmentPipeline, EnrichmentRequest};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::command_handlers::{handle_continue_game, handle_start_game};
use crate::domain::commands::{ContinueGame, StartGame};
use crate::domain::transitions::TurnResult;

/// A completed turn with its enrichment still in flight.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Session the turn belongs to.
    pub session_id: Uuid,
    /// What to show now.
    pub turn: TurnResult,
    /// Art, image and voice for the turn, resolving in the background.
    pub enrichment: EnrichmentHandle,
}

/// Drives sessions turn by turn.
#[derive(Clone)]
pub struct TurnOrchestrator {
    narrator: Arc<dyn NarrativeGenerator>,
    pipeline: EnrichmentPipeline,
    repo: Arc<dyn EventRepository>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TurnOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnOrchestrator")
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl TurnOrchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(
        narrator: Arc<dyn NarrativeGenerator>,
        pipeline: EnrichmentPipeline,
        repo: Arc<dyn EventRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            narrator,
            pipeline,
            repo,
            clock,
        }
    }

    /// The enrichment pipeline used for every turn.
    #[must_use]
    pub fn pipeline(&self) -> &EnrichmentPipeline {
        &self.pipeline
    }

    /// Opens a new session with its first scene. Art is always requested
    /// for the opening turn.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UpstreamNarrative` if the narrative generator
    /// fails; nothing is persisted in that case.
    #[instrument(skip(self), fields(session_id = tracing::field::Empty))]
    pub async fn start_turn(&self, correlation_id: Uuid) -> Result<TurnOutcome, DomainError> {
        let command = StartGame {
            correlation_id,
            session_id: Uuid::new_v4(),
        };
        tracing::Span::current()
            .record("session_id", tracing::field::display(command.session_id));

        let turn = handle_start_game(
            &command,
            Arc::clone(&self.narrator),
            self.clock.as_ref(),
            self.repo.as_ref(),
        )
        .await?;

        info!(session_id = %command.session_id, scene = %turn.scene_setting, "session started");

        let enrichment = self.enrich(command.session_id, &turn, true);
        Ok(TurnOutcome {
            session_id: command.session_id,
            turn,
            enrichment,
        })
    }

    /// Submits `choice_id` for `session_id` and produces the next turn. Art
    /// is requested only when the scene changed.
    ///
    /// # Errors
    ///
    /// Returns `SessionNotFound`, `SessionTerminated`, `InvalidChoice`,
    /// `UpstreamNarrative` or `ConcurrencyConflict`; the stored session is
    /// unchanged in every case.
    #[instrument(skip(self))]
    pub async fn advance_turn(
        &self,
        session_id: Uuid,
        choice_id: &str,
        correlation_id: Uuid,
    ) -> Result<TurnOutcome, DomainError> {
        let command = ContinueGame {
            correlation_id,
            session_id,
            choice_id: choice_id.to_owned(),
        };

        let turn = handle_continue_game(
            &command,
            Arc::clone(&self.narrator),
            self.clock.as_ref(),
            self.repo.as_ref(),
        )
        .await?;

        info!(
            turn_number = turn.turn_number,
            scene_changed = turn.scene_changed,
            game_over = turn.game_over,
            "turn advanced"
        );

        let enrichment = self.enrich(session_id, &turn, turn.scene_changed);
        Ok(TurnOutcome {
            session_id,
            turn,
            enrichment,
        })
    }

    fn enrich(&self, session_id: Uuid, turn: &TurnResult, include_art: bool) -> EnrichmentHandle {
        self.pipeline.launch(EnrichmentRequest {
            session_id,
            turn_number: turn.turn_number,
            scene_setting: turn.scene_setting.clone(),
            narrative: turn.narrative.clone(),
            include_art,
        })
    }
}
