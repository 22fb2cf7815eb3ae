//! The enrichment pipeline: art description feeding image generation, and
//! voice synthesis alongside it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use inkwell_core::generator::{
    ArtDescriptionGenerator, ArtDescriptor, ArtRequest, GeneratedImage, GenerationError,
    ImageGenerator, VoiceGenerator, VoicePayload, VoiceRequest,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::isolation::isolate;
use crate::outcome::{
    ArtOutcome, EnrichmentKind, EnrichmentReport, EnrichmentTag, EnrichmentUpdate, ImageOutcome,
    VoiceOutcome,
};
use crate::voice::validate_voice_payload;

/// What to enrich for one turn.
#[derive(Debug, Clone)]
pub struct EnrichmentRequest {
    /// Session the turn belongs to.
    pub session_id: Uuid,
    /// Turn number.
    pub turn_number: u32,
    /// Scene setting of the turn.
    pub scene_setting: String,
    /// Narrative of the turn; also the text that gets voiced.
    pub narrative: String,
    /// Whether to describe and render the scene.
    pub include_art: bool,
}

impl EnrichmentRequest {
    fn tag(&self) -> EnrichmentTag {
        EnrichmentTag {
            session_id: self.session_id,
            turn_number: self.turn_number,
        }
    }
}

/// Runs the non-critical generators of a turn.
#[derive(Clone)]
pub struct EnrichmentPipeline {
    art: Arc<dyn ArtDescriptionGenerator>,
    image: Arc<dyn ImageGenerator>,
    voice: Arc<dyn VoiceGenerator>,
    voice_id: String,
    call_timeout: Option<Duration>,
}

impl fmt::Debug for EnrichmentPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrichmentPipeline")
            .field("voice_id", &self.voice_id)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl EnrichmentPipeline {
    /// Creates a pipeline voicing turns with `voice_id`.
    #[must_use]
    pub fn new(
        art: Arc<dyn ArtDescriptionGenerator>,
        image: Arc<dyn ImageGenerator>,
        voice: Arc<dyn VoiceGenerator>,
        voice_id: impl Into<String>,
    ) -> Self {
        Self {
            art,
            image,
            voice,
            voice_id: voice_id.into(),
            call_timeout: None,
        }
    }

    /// Bounds every generator call by `timeout`.
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Voice used for turn narration.
    #[must_use]
    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    /// Describes a scene.
    ///
    /// # Errors
    ///
    /// Returns the generator's failure, a timeout, or `Unavailable` on panic.
    pub async fn describe_art(&self, request: ArtRequest) -> Result<ArtDescriptor, GenerationError> {
        let art = Arc::clone(&self.art);
        isolate("art description", self.call_timeout, async move {
            art.describe(&request).await
        })
        .await
    }

    /// Renders an art description.
    ///
    /// # Errors
    ///
    /// Returns the generator's failure, a timeout, or `Unavailable` on panic.
    pub async fn render_image(&self, art: ArtDescriptor) -> Result<GeneratedImage, GenerationError> {
        let image = Arc::clone(&self.image);
        isolate("image generation", self.call_timeout, async move {
            image.generate_image(&art).await
        })
        .await
    }

    /// Synthesizes speech and rejects degenerate payloads.
    ///
    /// # Errors
    ///
    /// Returns the generator's failure, a timeout, `Unavailable` on panic, or
    /// `Malformed` for a payload below the minimum size.
    pub async fn synthesize_voice(
        &self,
        request: VoiceRequest,
    ) -> Result<VoicePayload, GenerationError> {
        let voice = Arc::clone(&self.voice);
        let payload = isolate("voice synthesis", self.call_timeout, async move {
            voice.synthesize(&request).await
        })
        .await?;
        validate_voice_payload(payload)
    }

    /// Starts enrichment of a turn in the background.
    ///
    /// The visual chain runs only when `include_art` is set; voice always
    /// runs. Both stop when the returned handle is cancelled or dropped.
    #[must_use]
    pub fn launch(&self, request: EnrichmentRequest) -> EnrichmentHandle {
        let tag = request.tag();
        let token = CancellationToken::new();
        let (sender, receiver) = mpsc::channel(4);

        if request.include_art {
            let pipeline = self.clone();
            let sender = sender.clone();
            let token = token.clone();
            let art_request = ArtRequest {
                session_id: request.session_id,
                scene_setting: request.scene_setting.clone(),
                narrative: request.narrative.clone(),
            };
            tokio::spawn(async move {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        debug!(session_id = %tag.session_id, turn_number = tag.turn_number, "visual enrichment cancelled");
                    }
                    () = pipeline.run_visual_chain(tag, art_request, &sender) => {}
                }
            });
        }

        let pipeline = self.clone();
        let voice_token = token.clone();
        let voice_request = VoiceRequest {
            text: request.narrative,
            voice_id: self.voice_id.clone(),
        };
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = voice_token.cancelled() => {
                    debug!(session_id = %tag.session_id, turn_number = tag.turn_number, "voice enrichment cancelled");
                }
                () = pipeline.run_voice(tag, voice_request, &sender) => {}
            }
        });

        EnrichmentHandle {
            tag,
            include_art: request.include_art,
            updates: receiver,
            token,
        }
    }

    async fn run_visual_chain(
        &self,
        tag: EnrichmentTag,
        request: ArtRequest,
        sender: &mpsc::Sender<EnrichmentUpdate>,
    ) {
        let art = match self.describe_art(request).await {
            Ok(art) => art,
            Err(error) => {
                warn!(
                    session_id = %tag.session_id,
                    turn_number = tag.turn_number,
                    %error,
                    "art description failed, skipping image"
                );
                send(sender, tag, EnrichmentKind::Art(ArtOutcome::from(&error))).await;
                send(sender, tag, EnrichmentKind::Image(ImageOutcome::Skipped)).await;
                return;
            }
        };
        send(sender, tag, EnrichmentKind::Art(ArtOutcome::Ready(art.clone()))).await;

        let image = match self.render_image(art).await {
            Ok(image) => ImageOutcome::Ready(image),
            Err(error) => {
                warn!(
                    session_id = %tag.session_id,
                    turn_number = tag.turn_number,
                    %error,
                    "image generation failed"
                );
                ImageOutcome::from(&error)
            }
        };
        send(sender, tag, EnrichmentKind::Image(image)).await;
    }

    async fn run_voice(
        &self,
        tag: EnrichmentTag,
        request: VoiceRequest,
        sender: &mpsc::Sender<EnrichmentUpdate>,
    ) {
        let voice = match self.synthesize_voice(request).await {
            Ok(payload) => VoiceOutcome::Ready(payload),
            Err(error) => {
                warn!(
                    session_id = %tag.session_id,
                    turn_number = tag.turn_number,
                    %error,
                    "voice synthesis failed"
                );
                VoiceOutcome::from(&error)
            }
        };
        send(sender, tag, EnrichmentKind::Voice(voice)).await;
    }
}

async fn send(sender: &mpsc::Sender<EnrichmentUpdate>, tag: EnrichmentTag, kind: EnrichmentKind) {
    if sender.send(EnrichmentUpdate { tag, kind }).await.is_err() {
        debug!(
            session_id = %tag.session_id,
            turn_number = tag.turn_number,
            "enrichment receiver dropped"
        );
    }
}

/// In-flight enrichment of one turn.
///
/// Dropping the handle cancels whatever has not resolved yet.
#[derive(Debug)]
pub struct EnrichmentHandle {
    tag: EnrichmentTag,
    include_art: bool,
    updates: mpsc::Receiver<EnrichmentUpdate>,
    token: CancellationToken,
}

impl EnrichmentHandle {
    /// Turn this enrichment belongs to.
    #[must_use]
    pub fn tag(&self) -> EnrichmentTag {
        self.tag
    }

    /// Whether the visual chain was started.
    #[must_use]
    pub fn includes_art(&self) -> bool {
        self.include_art
    }

    /// Abandons the turn. Unresolved steps stay cancelled.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Token that fires when the turn is abandoned.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Whether the turn was abandoned.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits for the next resolved step. Returns `None` once everything
    /// resolved or the turn was abandoned.
    pub async fn next_update(&mut self) -> Option<EnrichmentUpdate> {
        if self.token.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            () = self.token.cancelled() => None,
            update = self.updates.recv() => update,
        }
    }

    /// Waits for every step and aggregates them. Steps that never resolved
    /// are reported as cancelled.
    pub async fn collect(mut self) -> EnrichmentReport {
        let mut report = EnrichmentReport::pending(self.tag, self.include_art);
        while let Some(update) = self.next_update().await {
            report.record(update.kind);
        }
        report.settle_cancelled()
    }
}

impl Drop for EnrichmentHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
