//! Client side of the gateway HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use inkwell_core::generator::VoicePayload;
use inkwell_enrichment::outcome::{EnrichmentNotice, EnrichmentTag, ImageOutcome};
use inkwell_narrative::domain::transitions::TurnResult;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PlayerError;

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// A played turn, as returned by `/game/start` and `/game/continue`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameTurn {
    /// Session the turn belongs to.
    pub session_id: Uuid,
    /// The turn itself.
    #[serde(flatten)]
    pub turn: TurnResult,
}

impl GameTurn {
    /// Tag identifying this turn's enrichment.
    #[must_use]
    pub fn tag(&self) -> EnrichmentTag {
        EnrichmentTag {
            session_id: self.session_id,
            turn_number: self.turn.turn_number,
        }
    }
}

/// Whether the gateway had resolved every enrichment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotState {
    /// Something was still running when the poll returned.
    Pending,
    /// Everything resolved.
    Complete,
}

/// Voice slot of an enrichment snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoiceSlot {
    /// `pending`, `ready`, `failed` or `cancelled`.
    pub status: String,
    /// Failure detail.
    #[serde(default)]
    pub reason: Option<String>,
    /// Size of the audio, when ready.
    #[serde(default)]
    pub bytes: Option<usize>,
}

/// Enrichment of one turn, as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnrichmentSnapshot {
    /// Session the turn belongs to.
    pub session_id: Uuid,
    /// Turn number.
    pub turn_number: u32,
    /// Whether every slot resolved.
    pub state: SnapshotState,
    /// Image slot; `{"status": "pending"}` while running.
    pub image: serde_json::Value,
    /// Voice slot.
    pub voice: VoiceSlot,
    /// Degradation notices.
    #[serde(default)]
    pub notices: Vec<EnrichmentNotice>,
}

impl EnrichmentSnapshot {
    /// The resolved image slot; `None` while still pending.
    #[must_use]
    pub fn image_outcome(&self) -> Option<ImageOutcome> {
        serde_json::from_value(self.image.clone()).ok()
    }

    /// Whether the voice is ready to download.
    #[must_use]
    pub fn voice_ready(&self) -> bool {
        self.voice.status == "ready"
    }
}

#[derive(Debug, Serialize)]
struct ContinueGameRequest<'a> {
    session_id: Uuid,
    choice_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

/// The gateway operations the player relies on.
#[async_trait]
pub trait GameGateway: Send + Sync {
    /// Starts a new game and returns its opening turn.
    async fn start_game(&self) -> Result<GameTurn, PlayerError>;

    /// Submits `choice_id` and returns the next turn.
    async fn continue_game(&self, session_id: Uuid, choice_id: &str)
    -> Result<GameTurn, PlayerError>;

    /// Reports the enrichment of a turn, waiting up to `wait` for it to
    /// settle.
    async fn enrichment(
        &self,
        tag: EnrichmentTag,
        wait: Duration,
    ) -> Result<EnrichmentSnapshot, PlayerError>;

    /// Downloads the narration of a turn.
    async fn voice(&self, tag: EnrichmentTag) -> Result<VoicePayload, PlayerError>;
}

/// [`GameGateway`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Creates a gateway client for `base_url` (for example
    /// `http://localhost:3000`).
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn game_url(&self, path: &str) -> String {
        format!("{}/api/v1/game{path}", self.base_url)
    }
}

/// Passes successful responses through and decodes the gateway error body
/// of any other.
async fn ensure_success(response: Response) -> Result<Response, PlayerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await?;
    let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.error, body.message),
        Err(_) => ("http_error".to_string(), text.trim().to_string()),
    };
    Err(PlayerError::Gateway {
        status: status.as_u16(),
        code,
        message,
    })
}

#[async_trait]
impl GameGateway for HttpGateway {
    async fn start_game(&self) -> Result<GameTurn, PlayerError> {
        let response = self.client.post(self.game_url("/start")).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn continue_game(
        &self,
        session_id: Uuid,
        choice_id: &str,
    ) -> Result<GameTurn, PlayerError> {
        let response = self
            .client
            .post(self.game_url("/continue"))
            .json(&ContinueGameRequest {
                session_id,
                choice_id,
            })
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn enrichment(
        &self,
        tag: EnrichmentTag,
        wait: Duration,
    ) -> Result<EnrichmentSnapshot, PlayerError> {
        let wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX);
        let response = self
            .client
            .get(self.game_url(&format!("/{}/enrichment", tag.session_id)))
            .query(&[
                ("turn", u64::from(tag.turn_number)),
                ("wait_ms", wait_ms),
            ])
            .timeout(wait + Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn voice(&self, tag: EnrichmentTag) -> Result<VoicePayload, PlayerError> {
        let response = self
            .client
            .get(self.game_url(&format!("/{}/voice", tag.session_id)))
            .query(&[("turn", tag.turn_number)])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();
        let bytes = response.bytes().await?.to_vec();

        Ok(VoicePayload {
            bytes,
            content_type,
        })
    }
}
