//! Routes for playing a game: turns, session state and turn enrichment.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get, routing::post};
use inkwell_core::error::DomainError;
use inkwell_enrichment::outcome::{EnrichmentNotice, EnrichmentReport, VoiceOutcome};
use inkwell_narrative::application::orchestrator::TurnOutcome;
use inkwell_narrative::application::query_handlers::{self, GameSessionView};
use inkwell_narrative::domain::transitions::TurnResult;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Longest a client may hold an enrichment poll open.
pub const MAX_ENRICHMENT_WAIT_MS: u64 = 30_000;

/// Request body for POST /continue.
#[derive(Debug, Deserialize)]
pub struct ContinueGameRequest {
    /// The session to advance.
    pub session_id: Uuid,
    /// Identifier of the picked choice.
    pub choice_id: String,
}

/// Response body of a played turn.
#[derive(Debug, Serialize)]
pub struct GameTurnResponse {
    /// The session the turn belongs to.
    pub session_id: Uuid,
    /// The turn itself.
    #[serde(flatten)]
    pub turn: TurnResult,
}

/// Query string of GET /{session_id}/enrichment.
#[derive(Debug, Deserialize)]
pub struct EnrichmentQuery {
    /// Turn to report on.
    pub turn: u32,
    /// How long to wait for the report to settle.
    #[serde(default)]
    pub wait_ms: Option<u64>,
}

/// Query string of GET /{session_id}/voice.
#[derive(Debug, Deserialize)]
pub struct VoiceQuery {
    /// Turn whose narration to fetch.
    pub turn: u32,
}

/// Whether every enrichment slot resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentState {
    /// Something is still running.
    Pending,
    /// Everything resolved.
    Complete,
}

/// Voice slot of the enrichment response. Audio is served separately.
#[derive(Debug, Serialize)]
pub struct VoiceStatus {
    /// `pending`, `ready`, `failed` or `cancelled`.
    pub status: &'static str,
    /// Failure detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// MIME type of the audio, when ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Size of the audio in bytes, when ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
}

impl VoiceStatus {
    fn from_outcome(outcome: Option<&VoiceOutcome>) -> Self {
        let Some(outcome) = outcome else {
            return Self {
                status: "pending",
                reason: None,
                content_type: None,
                bytes: None,
            };
        };
        let payload = outcome.payload();
        Self {
            status: outcome.status(),
            reason: outcome.reason().map(str::to_string),
            content_type: payload.map(|p| p.content_type.clone()),
            bytes: payload.map(|p| p.bytes.len()),
        }
    }
}

/// Response body of GET /{session_id}/enrichment.
#[derive(Debug, Serialize)]
pub struct EnrichmentResponse {
    /// The session.
    pub session_id: Uuid,
    /// The turn.
    pub turn_number: u32,
    /// Whether everything resolved.
    pub state: EnrichmentState,
    /// Art description slot; `{"status": "pending"}` while running.
    pub art: serde_json::Value,
    /// Image slot; `{"status": "pending"}` while running.
    pub image: serde_json::Value,
    /// Voice slot.
    pub voice: VoiceStatus,
    /// Degradation notices for the player.
    pub notices: Vec<EnrichmentNotice>,
}

fn slot<T: Serialize>(outcome: Option<&T>) -> serde_json::Value {
    outcome
        .and_then(|o| serde_json::to_value(o).ok())
        .unwrap_or_else(|| serde_json::json!({ "status": "pending" }))
}

impl From<&EnrichmentReport> for EnrichmentResponse {
    fn from(report: &EnrichmentReport) -> Self {
        Self {
            session_id: report.tag.session_id,
            turn_number: report.tag.turn_number,
            state: if report.is_settled() {
                EnrichmentState::Complete
            } else {
                EnrichmentState::Pending
            },
            art: slot(report.art.as_ref()),
            image: slot(report.image.as_ref()),
            voice: VoiceStatus::from_outcome(report.voice.as_ref()),
            notices: report.notices(),
        }
    }
}

fn track(state: &AppState, outcome: TurnOutcome) -> GameTurnResponse {
    state
        .enrichment
        .track(outcome.enrichment, outcome.turn.game_over);
    GameTurnResponse {
        session_id: outcome.session_id,
        turn: outcome.turn,
    }
}

fn not_tracked(session_id: Uuid, turn: u32) -> ApiError {
    ApiError::NotFound {
        code: "enrichment_not_found",
        message: format!("no enrichment tracked for turn {turn} of session {session_id}"),
    }
}

/// POST /start
#[instrument(skip(state))]
async fn start_game(State(state): State<AppState>) -> Result<Json<GameTurnResponse>, ApiError> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "handling start_game command");

    let outcome = state.orchestrator.start_turn(correlation_id).await?;

    Ok(Json(track(&state, outcome)))
}

/// POST /continue
#[instrument(skip(state, request), fields(session_id = %request.session_id))]
async fn continue_game(
    State(state): State<AppState>,
    Json(request): Json<ContinueGameRequest>,
) -> Result<Json<GameTurnResponse>, ApiError> {
    if request.choice_id.trim().is_empty() {
        return Err(DomainError::Validation("choice_id must not be empty".to_string()).into());
    }
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, choice_id = %request.choice_id, "handling continue_game command");

    let outcome = state
        .orchestrator
        .advance_turn(request.session_id, &request.choice_id, correlation_id)
        .await?;

    Ok(Json(track(&state, outcome)))
}

/// GET /{session_id}
#[instrument(skip(state))]
async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<GameSessionView>, ApiError> {
    let view = query_handlers::get_session_by_id(session_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// GET /{session_id}/enrichment?turn=N&wait_ms=M
#[instrument(skip(state, query), fields(turn_number = query.turn))]
async fn get_enrichment(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<EnrichmentQuery>,
) -> Result<Json<EnrichmentResponse>, ApiError> {
    let wait = Duration::from_millis(query.wait_ms.unwrap_or(0).min(MAX_ENRICHMENT_WAIT_MS));
    let report = state
        .enrichment
        .wait_settled(session_id, query.turn, wait)
        .await
        .ok_or_else(|| not_tracked(session_id, query.turn))?;

    Ok(Json(EnrichmentResponse::from(&report)))
}

/// GET /{session_id}/voice?turn=N
#[instrument(skip(state, query), fields(turn_number = query.turn))]
async fn get_voice(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<VoiceQuery>,
) -> Result<Response, ApiError> {
    let report = state
        .enrichment
        .snapshot(session_id, query.turn)
        .ok_or_else(|| not_tracked(session_id, query.turn))?;
    let payload = report
        .voice
        .as_ref()
        .and_then(VoiceOutcome::payload)
        .ok_or_else(|| ApiError::NotFound {
            code: "voice_not_ready",
            message: format!("no voice for turn {} of session {session_id}", query.turn),
        })?;

    Ok((
        [(header::CONTENT_TYPE, payload.content_type.clone())],
        payload.bytes.clone(),
    )
        .into_response())
}

/// Returns the router for the game context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(start_game))
        .route("/continue", post(continue_game))
        .route("/{session_id}", get(get_session))
        .route("/{session_id}/enrichment", get(get_enrichment))
        .route("/{session_id}/voice", get(get_voice))
}
