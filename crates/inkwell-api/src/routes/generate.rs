//! Standalone generator routes: art description, image and voice.
//!
//! These call the same isolated pipeline steps the turn enrichment uses,
//! for clients that drive enrichment themselves.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use inkwell_core::error::DomainError;
use inkwell_core::generator::{ArtDescriptor, ArtRequest, VoiceRequest};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /art.
#[derive(Debug, Deserialize)]
pub struct ArtGenerationRequest {
    /// Session the scene belongs to.
    pub session_id: Uuid,
    /// Location label of the scene.
    pub scene_setting: String,
    /// Narrative of the scene.
    pub curr_narrative: String,
}

/// Request body for POST /image.
#[derive(Debug, Deserialize)]
pub struct ImageGenerationRequest {
    /// What the scene looks like.
    pub art_description: String,
    /// Style hints.
    #[serde(default)]
    pub style_notes: String,
}

/// Response body of POST /image. Failures are reported in `error`.
#[derive(Debug, Serialize)]
pub struct ImageGenerationResponse {
    /// URL or `data:` URL of the image.
    pub image_url: Option<String>,
    /// Whether the image came from the semantic cache.
    pub cached: bool,
    /// Failure detail.
    pub error: Option<String>,
}

/// Request body for POST /voice.
#[derive(Debug, Deserialize)]
pub struct VoiceGenerationRequest {
    /// Text to speak.
    pub text: String,
    /// Provider voice; the configured narrator when absent.
    #[serde(default)]
    pub voice_id: Option<String>,
}

/// POST /art
#[instrument(skip(state, request), fields(session_id = %request.session_id))]
async fn generate_art(
    State(state): State<AppState>,
    Json(request): Json<ArtGenerationRequest>,
) -> Result<Json<ArtDescriptor>, ApiError> {
    let art = state
        .pipeline()
        .describe_art(ArtRequest {
            session_id: request.session_id,
            scene_setting: request.scene_setting,
            narrative: request.curr_narrative,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "art description failed");
            ApiError::art_generation(e)
        })?;

    Ok(Json(art))
}

/// POST /image
#[instrument(skip(state, request))]
async fn generate_image(
    State(state): State<AppState>,
    Json(request): Json<ImageGenerationRequest>,
) -> Result<Json<ImageGenerationResponse>, ApiError> {
    if request.art_description.trim().is_empty() {
        return Err(DomainError::Validation("art_description must not be empty".to_string()).into());
    }

    let result = state
        .pipeline()
        .render_image(ArtDescriptor {
            art_description: request.art_description,
            style_notes: request.style_notes,
        })
        .await;

    let response = match result {
        Ok(image) => ImageGenerationResponse {
            image_url: Some(image.image_url),
            cached: image.cached,
            error: None,
        },
        Err(e) => {
            warn!(error = %e, "image generation failed");
            ImageGenerationResponse {
                image_url: None,
                cached: false,
                error: Some(e.to_string()),
            }
        }
    };
    Ok(Json(response))
}

/// POST /voice
#[instrument(skip(state, request))]
async fn generate_voice(
    State(state): State<AppState>,
    Json(request): Json<VoiceGenerationRequest>,
) -> Result<Response, ApiError> {
    if request.text.trim().is_empty() {
        return Err(DomainError::Validation("text must not be empty".to_string()).into());
    }
    let voice_id = request
        .voice_id
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| state.pipeline().voice_id().to_string());

    let payload = state
        .pipeline()
        .synthesize_voice(VoiceRequest {
            text: request.text,
            voice_id,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "voice synthesis failed");
            ApiError::voice_generation(e)
        })?;

    Ok(([(header::CONTENT_TYPE, payload.content_type)], payload.bytes).into_response())
}

/// Returns the router for the generator routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/art", post(generate_art))
        .route("/image", post(generate_image))
        .route("/voice", post(generate_voice))
}
