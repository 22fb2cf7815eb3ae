//! Turn presentation with enrichment backfill.
//!
//! Every turn is shown as soon as the gateway returns it. A backfill task
//! then long-polls the turn's enrichment and reports back over a channel,
//! tagged with the turn it belongs to. Results for any turn other than the
//! one on screen are dropped, and starting a new game or advancing the story
//! cancels the backfill in flight. When the scene is unchanged a pending
//! image stays pending: the gateway carries it into the next turn's
//! enrichment.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use inkwell_core::generator::VoicePayload;
use inkwell_enrichment::outcome::{EnrichmentNotice, EnrichmentTag};
use inkwell_enrichment::voice::validate_voice_payload;
use inkwell_narrative::domain::transitions::TurnResult;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::PlayerError;
use crate::gateway::{GameGateway, GameTurn, SnapshotState};

/// Image shown alongside the narrative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageView {
    /// Nothing to show.
    None,
    /// The scene is being painted.
    Pending,
    /// URL or `data:` URL of the scene.
    Ready(String),
}

/// Narration of the current turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceView {
    /// Still being synthesized.
    Pending,
    /// Audio arrived.
    Ready {
        /// Size of the clip.
        bytes: usize,
        /// Where the clip was written, when an audio directory is set.
        saved_to: Option<PathBuf>,
    },
    /// No narration for this turn.
    Unavailable,
}

/// Everything the terminal shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// Session being played.
    pub session_id: Option<Uuid>,
    /// Turn on screen.
    pub turn: Option<TurnResult>,
    /// Scene image.
    pub image: ImageView,
    /// Narration.
    pub voice: VoiceView,
    /// Degradation notices for the turn on screen.
    pub notices: Vec<EnrichmentNotice>,
    /// Message of the last failed action.
    pub error: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            session_id: None,
            turn: None,
            image: ImageView::None,
            voice: VoiceView::Unavailable,
            notices: Vec::new(),
            error: None,
        }
    }
}

impl ViewState {
    /// Tag of the turn on screen.
    #[must_use]
    pub fn tag(&self) -> Option<EnrichmentTag> {
        let session_id = self.session_id?;
        let turn = self.turn.as_ref()?;
        Some(EnrichmentTag {
            session_id,
            turn_number: turn.turn_number,
        })
    }

    fn push_notice(&mut self, notice: EnrichmentNotice) {
        if !self.notices.contains(&notice) {
            self.notices.push(notice);
        }
    }
}

/// Enrichment gathered for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backfill {
    /// Image URL, when one was produced.
    pub image_url: Option<String>,
    /// Narration outcome.
    pub voice: VoiceView,
    /// Degradation notices.
    pub notices: Vec<EnrichmentNotice>,
}

impl Backfill {
    fn unavailable() -> Self {
        Self {
            image_url: None,
            voice: VoiceView::Unavailable,
            notices: vec![
                EnrichmentNotice::ImageUnavailable,
                EnrichmentNotice::VoiceUnavailable,
            ],
        }
    }
}

/// Messages delivered to the presenter from background tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Enrichment of the turn identified by `tag` resolved.
    Backfill {
        /// Turn the enrichment belongs to.
        tag: EnrichmentTag,
        /// What resolved.
        backfill: Backfill,
    },
}

/// Drives a game through a [`GameGateway`] and keeps the [`ViewState`].
pub struct Presenter {
    gateway: Arc<dyn GameGateway>,
    view: ViewState,
    backfill: Option<CancellationToken>,
    events: mpsc::UnboundedSender<PlayerEvent>,
    enrichment_wait: Duration,
    audio_dir: Option<PathBuf>,
}

impl std::fmt::Debug for Presenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presenter")
            .field("view", &self.view)
            .field("enrichment_wait", &self.enrichment_wait)
            .field("audio_dir", &self.audio_dir)
            .finish_non_exhaustive()
    }
}

impl Presenter {
    /// Creates a presenter and the receiver its backfill events arrive on.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn GameGateway>,
        enrichment_wait: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<PlayerEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let presenter = Self {
            gateway,
            view: ViewState::default(),
            backfill: None,
            events,
            enrichment_wait,
            audio_dir: None,
        };
        (presenter, receiver)
    }

    /// Writes narration clips into `dir`.
    #[must_use]
    pub fn with_audio_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audio_dir = Some(dir.into());
        self
    }

    /// The current view.
    #[must_use]
    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Starts a new game, abandoning the current one.
    ///
    /// # Errors
    ///
    /// Returns the gateway error. The previous view stays on screen with
    /// the error recorded.
    pub async fn start_game(&mut self) -> Result<(), PlayerError> {
        match self.gateway.start_game().await {
            Ok(turn) => {
                self.show(turn);
                Ok(())
            }
            Err(e) => Err(self.record(e)),
        }
    }

    /// Submits a choice, given by id or by its 1-based position. An exact id
    /// wins over a position.
    ///
    /// # Errors
    ///
    /// Returns `PlayerError::NoGame`, `PlayerError::GameOver` or
    /// `PlayerError::UnknownChoice` without calling the gateway, or the
    /// gateway error. The previous view stays on screen in every case.
    pub async fn choose(&mut self, input: &str) -> Result<(), PlayerError> {
        let (session_id, choice_id) = match self.resolve_choice(input) {
            Ok(resolved) => resolved,
            Err(e) => return Err(self.record(e)),
        };

        match self.gateway.continue_game(session_id, &choice_id).await {
            Ok(turn) => {
                self.show(turn);
                Ok(())
            }
            Err(e) => Err(self.record(e)),
        }
    }

    /// Folds a background event into the view. Returns `false` when the
    /// event belongs to a turn that is no longer on screen.
    pub fn apply(&mut self, event: PlayerEvent) -> bool {
        let PlayerEvent::Backfill { tag, backfill } = event;
        if self.view.tag() != Some(tag) {
            debug!(
                session_id = %tag.session_id,
                turn_number = tag.turn_number,
                "discarding stale backfill"
            );
            return false;
        }

        match backfill.image_url {
            Some(url) => self.view.image = ImageView::Ready(url),
            None if self.view.image == ImageView::Pending => self.view.image = ImageView::None,
            None => {}
        }
        self.view.voice = backfill.voice;
        for notice in backfill.notices {
            self.view.push_notice(notice);
        }
        true
    }

    fn resolve_choice(&self, input: &str) -> Result<(Uuid, String), PlayerError> {
        let (Some(session_id), Some(turn)) = (self.view.session_id, self.view.turn.as_ref()) else {
            return Err(PlayerError::NoGame);
        };
        if turn.game_over {
            return Err(PlayerError::GameOver);
        }

        let input = input.trim();
        let choice = turn
            .choices
            .iter()
            .find(|c| c.id == input)
            .or_else(|| {
                input
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| turn.choices.get(i))
            })
            .ok_or_else(|| PlayerError::UnknownChoice(input.to_string()))?;

        Ok((session_id, choice.id.clone()))
    }

    fn record(&mut self, error: PlayerError) -> PlayerError {
        warn!(error = %error, "action failed");
        self.view.error = Some(error.to_string());
        error
    }

    fn show(&mut self, turn: GameTurn) {
        let tag = turn.tag();
        let image = if turn.turn.scene_changed {
            ImageView::Pending
        } else if self.view.session_id == Some(turn.session_id) {
            self.view.image.clone()
        } else {
            ImageView::None
        };

        self.view = ViewState {
            session_id: Some(turn.session_id),
            turn: Some(turn.turn),
            image,
            voice: VoiceView::Pending,
            notices: Vec::new(),
            error: None,
        };
        self.spawn_backfill(tag);
    }

    fn spawn_backfill(&mut self, tag: EnrichmentTag) {
        let token = CancellationToken::new();
        if let Some(previous) = self.backfill.replace(token.clone()) {
            previous.cancel();
        }

        let gateway = Arc::clone(&self.gateway);
        let events = self.events.clone();
        let wait = self.enrichment_wait;
        let audio_dir = self.audio_dir.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    debug!(turn_number = tag.turn_number, "backfill cancelled");
                }
                backfill = fetch_backfill(gateway.as_ref(), tag, wait, audio_dir.as_deref()) => {
                    // The receiver is gone once the player exits.
                    let _ = events.send(PlayerEvent::Backfill { tag, backfill });
                }
            }
        });
    }
}

impl Drop for Presenter {
    fn drop(&mut self) {
        if let Some(token) = self.backfill.take() {
            token.cancel();
        }
    }
}

async fn fetch_backfill(
    gateway: &dyn GameGateway,
    tag: EnrichmentTag,
    wait: Duration,
    audio_dir: Option<&Path>,
) -> Backfill {
    let snapshot = match gateway.enrichment(tag, wait).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(error = %e, turn_number = tag.turn_number, "enrichment unavailable");
            return Backfill::unavailable();
        }
    };

    let mut notices = snapshot.notices.clone();
    let image = snapshot.image_outcome();
    if image.is_none() && snapshot.state == SnapshotState::Pending {
        notices.push(EnrichmentNotice::ImageUnavailable);
    }
    let image_url = image.and_then(|o| o.image().map(|i| i.image_url.clone()));

    let voice = if snapshot.voice_ready() {
        download_voice(gateway, tag, audio_dir).await
    } else {
        if snapshot.voice.status == "pending" {
            warn!(turn_number = tag.turn_number, "voice still pending after wait");
        }
        VoiceView::Unavailable
    };
    if voice == VoiceView::Unavailable
        && snapshot.voice.status != "cancelled"
        && !notices.contains(&EnrichmentNotice::VoiceUnavailable)
    {
        notices.push(EnrichmentNotice::VoiceUnavailable);
    }

    Backfill {
        image_url,
        voice,
        notices,
    }
}

async fn download_voice(
    gateway: &dyn GameGateway,
    tag: EnrichmentTag,
    audio_dir: Option<&Path>,
) -> VoiceView {
    let payload = match gateway.voice(tag).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, turn_number = tag.turn_number, "voice download failed");
            return VoiceView::Unavailable;
        }
    };
    let payload = match validate_voice_payload(payload) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, turn_number = tag.turn_number, "discarding degenerate voice");
            return VoiceView::Unavailable;
        }
    };

    let saved_to = match audio_dir {
        Some(dir) => save_clip(dir, tag, &payload)
            .await
            .map_err(|e| warn!(error = %e, "could not save narration"))
            .ok(),
        None => None,
    };

    VoiceView::Ready {
        bytes: payload.bytes.len(),
        saved_to,
    }
}

async fn save_clip(
    dir: &Path,
    tag: EnrichmentTag,
    payload: &VoicePayload,
) -> Result<PathBuf, std::io::Error> {
    let extension = match payload.content_type.as_str() {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        _ => "bin",
    };
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!(
        "{}-turn-{:02}.{extension}",
        tag.session_id, tag.turn_number
    ));
    tokio::fs::write(&path, &payload.bytes).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use inkwell_core::story::{Choice, GameStatus, RiskLevel};
    use serde_json::json;

    use super::*;
    use crate::gateway::{EnrichmentSnapshot, VoiceSlot};

    fn turn(session_id: Uuid, turn_number: u32, scene: &str, scene_changed: bool) -> GameTurn {
        GameTurn {
            session_id,
            turn: TurnResult {
                turn_number,
                narrative: format!("Turn {turn_number} unfolds."),
                scene_setting: scene.to_string(),
                scene_changed,
                choices: vec![
                    Choice {
                        id: "c1".to_string(),
                        description: "Go to the king.".to_string(),
                        risk_level: RiskLevel::High,
                    },
                    Choice {
                        id: "c2".to_string(),
                        description: "Wait.".to_string(),
                        risk_level: RiskLevel::Low,
                    },
                ],
                characters: vec![],
                status: GameStatus::Active,
                game_over: false,
                victory: false,
                ending_reason: None,
            },
        }
    }

    fn complete_snapshot(tag: EnrichmentTag) -> EnrichmentSnapshot {
        EnrichmentSnapshot {
            session_id: tag.session_id,
            turn_number: tag.turn_number,
            state: SnapshotState::Complete,
            image: json!({ "status": "ready", "image_url": "https://images.test/1.png" }),
            voice: VoiceSlot {
                status: "ready".to_string(),
                reason: None,
                bytes: Some(4096),
            },
            notices: vec![],
        }
    }

    struct FakeGateway {
        turns: Mutex<VecDeque<Result<GameTurn, PlayerError>>>,
        voice_len: usize,
        stall_enrichment: bool,
        continued: Mutex<Vec<String>>,
    }

    impl FakeGateway {
        fn new(turns: Vec<Result<GameTurn, PlayerError>>) -> Self {
            Self {
                turns: Mutex::new(turns.into()),
                voice_len: 4096,
                stall_enrichment: false,
                continued: Mutex::new(Vec::new()),
            }
        }

        fn next_turn(&self) -> Result<GameTurn, PlayerError> {
            self.turns
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted turn left")
        }
    }

    #[async_trait]
    impl GameGateway for FakeGateway {
        async fn start_game(&self) -> Result<GameTurn, PlayerError> {
            self.next_turn()
        }

        async fn continue_game(
            &self,
            _session_id: Uuid,
            choice_id: &str,
        ) -> Result<GameTurn, PlayerError> {
            self.continued.lock().unwrap().push(choice_id.to_string());
            self.next_turn()
        }

        async fn enrichment(
            &self,
            tag: EnrichmentTag,
            _wait: Duration,
        ) -> Result<EnrichmentSnapshot, PlayerError> {
            if self.stall_enrichment {
                std::future::pending::<()>().await;
            }
            Ok(complete_snapshot(tag))
        }

        async fn voice(&self, _tag: EnrichmentTag) -> Result<VoicePayload, PlayerError> {
            Ok(VoicePayload {
                bytes: vec![0; self.voice_len],
                content_type: "audio/mpeg".to_string(),
            })
        }
    }

    fn gateway_error() -> PlayerError {
        PlayerError::Gateway {
            status: 502,
            code: "upstream_narrative_error".to_string(),
            message: "narrative generation failed".to_string(),
        }
    }

    #[tokio::test]
    async fn test_start_game_renders_turn_then_backfills() {
        // Arrange
        let session_id = Uuid::new_v4();
        let gateway = Arc::new(FakeGateway::new(vec![Ok(turn(session_id, 0, "Red Keep", true))]));
        let (mut presenter, mut events) = Presenter::new(gateway, Duration::from_secs(1));

        // Act
        presenter.start_game().await.unwrap();

        // Assert
        assert_eq!(presenter.view().image, ImageView::Pending);
        assert_eq!(presenter.view().voice, VoiceView::Pending);
        assert_eq!(presenter.view().turn.as_ref().unwrap().turn_number, 0);

        let event = events.recv().await.unwrap();
        assert!(presenter.apply(event));
        assert_eq!(
            presenter.view().image,
            ImageView::Ready("https://images.test/1.png".to_string())
        );
        assert_eq!(
            presenter.view().voice,
            VoiceView::Ready {
                bytes: 4096,
                saved_to: None
            }
        );
        assert!(presenter.view().notices.is_empty());
    }

    #[tokio::test]
    async fn test_stale_backfill_is_discarded() {
        // Arrange
        let session_id = Uuid::new_v4();
        let gateway = Arc::new(FakeGateway::new(vec![
            Ok(turn(session_id, 0, "Red Keep", true)),
            Ok(turn(session_id, 1, "Red Keep", false)),
        ]));
        let (mut presenter, mut events) = Presenter::new(gateway, Duration::from_secs(1));
        presenter.start_game().await.unwrap();
        let opening = events.recv().await.unwrap();

        // Act
        presenter.choose("c1").await.unwrap();
        let applied = presenter.apply(opening);

        // Assert
        assert!(!applied);
        assert_eq!(presenter.view().voice, VoiceView::Pending);
    }

    #[tokio::test]
    async fn test_degenerate_voice_becomes_voice_unavailable() {
        // Arrange
        let session_id = Uuid::new_v4();
        let mut fake = FakeGateway::new(vec![Ok(turn(session_id, 0, "Red Keep", true))]);
        fake.voice_len = 12;
        let (mut presenter, mut events) = Presenter::new(Arc::new(fake), Duration::from_secs(1));
        presenter.start_game().await.unwrap();

        // Act
        let event = events.recv().await.unwrap();
        presenter.apply(event);

        // Assert
        assert_eq!(presenter.view().voice, VoiceView::Unavailable);
        assert_eq!(
            presenter.view().notices,
            vec![EnrichmentNotice::VoiceUnavailable]
        );
    }

    #[tokio::test]
    async fn test_gateway_error_keeps_previous_view_and_allows_retry() {
        // Arrange
        let session_id = Uuid::new_v4();
        let gateway = Arc::new(FakeGateway::new(vec![
            Ok(turn(session_id, 0, "Red Keep", true)),
            Err(gateway_error()),
            Ok(turn(session_id, 1, "Throne room", true)),
        ]));
        let (mut presenter, _events) = Presenter::new(gateway, Duration::from_secs(1));
        presenter.start_game().await.unwrap();

        // Act
        let result = presenter.choose("c2").await;

        // Assert
        assert_eq!(result.unwrap_err().code(), Some("upstream_narrative_error"));
        let view = presenter.view();
        assert_eq!(view.turn.as_ref().unwrap().turn_number, 0);
        assert!(view.error.as_deref().unwrap().contains("narrative generation failed"));

        presenter.choose("c2").await.unwrap();
        assert_eq!(presenter.view().turn.as_ref().unwrap().scene_setting, "Throne room");
        assert!(presenter.view().error.is_none());
    }

    #[tokio::test]
    async fn test_choice_by_position_resolves_to_id() {
        let session_id = Uuid::new_v4();
        let gateway = Arc::new(FakeGateway::new(vec![
            Ok(turn(session_id, 0, "Red Keep", true)),
            Ok(turn(session_id, 1, "Red Keep", false)),
        ]));
        let (mut presenter, _events) = Presenter::new(gateway.clone(), Duration::from_secs(1));
        presenter.start_game().await.unwrap();

        presenter.choose("2").await.unwrap();

        assert_eq!(*gateway.continued.lock().unwrap(), vec!["c2".to_string()]);
    }

    #[tokio::test]
    async fn test_numeric_choice_id_wins_over_position() {
        // Arrange
        let session_id = Uuid::new_v4();
        let mut opening = turn(session_id, 0, "Red Keep", true);
        opening.turn.choices[0].id = "2".to_string();
        opening.turn.choices[1].id = "1".to_string();
        let gateway = Arc::new(FakeGateway::new(vec![
            Ok(opening),
            Ok(turn(session_id, 1, "Red Keep", false)),
        ]));
        let (mut presenter, _events) = Presenter::new(gateway.clone(), Duration::from_secs(1));
        presenter.start_game().await.unwrap();

        // Act
        presenter.choose("2").await.unwrap();

        // Assert
        assert_eq!(*gateway.continued.lock().unwrap(), vec!["2".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_choice_and_missing_game_are_rejected_locally() {
        let gateway = Arc::new(FakeGateway::new(vec![Ok(turn(
            Uuid::new_v4(),
            0,
            "Red Keep",
            true,
        ))]));
        let (mut presenter, _events) = Presenter::new(gateway.clone(), Duration::from_secs(1));

        assert!(matches!(presenter.choose("c1").await, Err(PlayerError::NoGame)));

        presenter.start_game().await.unwrap();
        assert!(matches!(
            presenter.choose("flee").await,
            Err(PlayerError::UnknownChoice(_))
        ));
        assert!(gateway.continued.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_finished_story_rejects_choices() {
        let session_id = Uuid::new_v4();
        let mut ending = turn(session_id, 15, "Great Sept of Baelor", true);
        ending.turn.choices.clear();
        ending.turn.game_over = true;
        ending.turn.status = GameStatus::Defeat;
        let gateway = Arc::new(FakeGateway::new(vec![Ok(ending)]));
        let (mut presenter, _events) = Presenter::new(gateway, Duration::from_secs(1));
        presenter.start_game().await.unwrap();

        let result = presenter.choose("1").await;

        assert!(matches!(result, Err(PlayerError::GameOver)));
    }

    #[tokio::test]
    async fn test_unchanged_scene_keeps_previous_image() {
        let session_id = Uuid::new_v4();
        let gateway = Arc::new(FakeGateway::new(vec![
            Ok(turn(session_id, 0, "Red Keep", true)),
            Ok(turn(session_id, 1, "Red Keep", false)),
        ]));
        let (mut presenter, mut events) = Presenter::new(gateway, Duration::from_secs(1));
        presenter.start_game().await.unwrap();
        let event = events.recv().await.unwrap();
        presenter.apply(event);

        presenter.choose("c1").await.unwrap();

        assert_eq!(
            presenter.view().image,
            ImageView::Ready("https://images.test/1.png".to_string())
        );
    }

    #[tokio::test]
    async fn test_pending_image_is_backfilled_by_next_unchanged_turn() {
        // Arrange
        let session_id = Uuid::new_v4();
        let gateway = Arc::new(FakeGateway::new(vec![
            Ok(turn(session_id, 0, "Red Keep", true)),
            Ok(turn(session_id, 1, "Red Keep", false)),
        ]));
        let (mut presenter, mut events) = Presenter::new(gateway, Duration::from_secs(1));
        presenter.start_game().await.unwrap();

        // Act
        presenter.choose("c1").await.unwrap();
        let still_pending = presenter.view().image.clone();
        while let Some(event) = events.recv().await {
            if presenter.apply(event) {
                break;
            }
        }

        // Assert
        assert_eq!(still_pending, ImageView::Pending);
        assert_eq!(presenter.view().turn.as_ref().unwrap().turn_number, 1);
        assert_eq!(
            presenter.view().image,
            ImageView::Ready("https://images.test/1.png".to_string())
        );
    }

    #[tokio::test]
    async fn test_new_game_abandons_stalled_backfill() {
        // Arrange
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let mut fake = FakeGateway::new(vec![
            Ok(turn(first, 0, "Red Keep", true)),
            Ok(turn(second, 0, "Red Keep", true)),
        ]);
        fake.stall_enrichment = true;
        let (mut presenter, mut events) = Presenter::new(Arc::new(fake), Duration::from_secs(1));
        presenter.start_game().await.unwrap();

        // Act
        presenter.start_game().await.unwrap();
        drop(presenter);

        // Assert
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_voice_clip_is_saved_to_audio_dir() {
        let dir = std::env::temp_dir().join(format!("inkwell-player-{}", Uuid::new_v4()));
        let session_id = Uuid::new_v4();
        let gateway = Arc::new(FakeGateway::new(vec![Ok(turn(session_id, 3, "Red Keep", true))]));
        let (presenter, mut events) = Presenter::new(gateway, Duration::from_secs(1));
        let mut presenter = presenter.with_audio_dir(&dir);
        presenter.start_game().await.unwrap();

        let event = events.recv().await.unwrap();
        presenter.apply(event);

        let VoiceView::Ready { saved_to: Some(path), .. } = &presenter.view().voice else {
            panic!("voice was not saved: {:?}", presenter.view().voice);
        };
        assert!(path.ends_with(format!("{session_id}-turn-03.mp3")));
        assert_eq!(std::fs::read(path).unwrap().len(), 4096);
        let _ = std::fs::remove_dir_all(dir);
    }
}
