//! Test generators — scripted and failing doubles for every generator port.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use inkwell_core::generator::{
    ArtDescriptionGenerator, ArtDescriptor, ArtRequest, EmbeddingProvider, GeneratedImage,
    GenerationError, ImageGenerator, NarrativeContext, NarrativeDraft, NarrativeGenerator,
    VoiceGenerator, VoicePayload, VoiceRequest,
};
use inkwell_core::story::{Choice, RiskLevel};
use tokio::sync::Semaphore;

/// Builds a low-risk choice with a generated description.
#[must_use]
pub fn choice(id: &str) -> Choice {
    Choice {
        id: id.to_owned(),
        description: format!("Take option {id}."),
        risk_level: RiskLevel::Low,
    }
}

/// Builds a non-terminal draft offering `choice_ids`.
#[must_use]
pub fn draft(narrative: &str, scene_setting: &str, choice_ids: &[&str]) -> NarrativeDraft {
    NarrativeDraft {
        narrative: narrative.to_owned(),
        scene_setting: scene_setting.to_owned(),
        choices: choice_ids.iter().map(|id| choice(id)).collect(),
        ..NarrativeDraft::default()
    }
}

/// Builds a draft that ends the game.
#[must_use]
pub fn terminal_draft(narrative: &str, scene_setting: &str, victory: bool) -> NarrativeDraft {
    NarrativeDraft {
        narrative: narrative.to_owned(),
        scene_setting: scene_setting.to_owned(),
        game_over: true,
        victory,
        ..NarrativeDraft::default()
    }
}

/// A narrative generator that plays back a script, then continues forever
/// with non-terminal turns in an unchanging scene offering `c1` and `c2`.
/// Records every context it receives.
#[derive(Debug, Default)]
pub struct ScriptedNarrativeGenerator {
    script: Mutex<VecDeque<Result<NarrativeDraft, GenerationError>>>,
    contexts: Mutex<Vec<NarrativeContext>>,
}

impl ScriptedNarrativeGenerator {
    /// Script of results, consumed one per call.
    #[must_use]
    pub fn new(script: Vec<Result<NarrativeDraft, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            contexts: Mutex::new(Vec::new()),
        }
    }

    /// Script of successful drafts.
    #[must_use]
    pub fn from_drafts(drafts: Vec<NarrativeDraft>) -> Self {
        Self::new(drafts.into_iter().map(Ok).collect())
    }

    /// No script: every call yields the default continuation.
    #[must_use]
    pub fn endless() -> Self {
        Self::default()
    }

    /// Contexts received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn contexts(&self) -> Vec<NarrativeContext> {
        self.contexts.lock().unwrap().clone()
    }

    /// Number of `generate` calls so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn call_count(&self) -> usize {
        self.contexts.lock().unwrap().len()
    }
}

#[async_trait]
impl NarrativeGenerator for ScriptedNarrativeGenerator {
    async fn generate(&self, context: &NarrativeContext) -> Result<NarrativeDraft, GenerationError> {
        self.contexts.lock().unwrap().push(context.clone());
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(draft(
                &format!("The story continues (turn {}).", context.turn_number),
                "Red Keep",
                &["c1", "c2"],
            ))
        })
    }
}

/// A narrative generator that always fails with the given error.
#[derive(Debug)]
pub struct FailingNarrativeGenerator(pub GenerationError);

#[async_trait]
impl NarrativeGenerator for FailingNarrativeGenerator {
    async fn generate(
        &self,
        _context: &NarrativeContext,
    ) -> Result<NarrativeDraft, GenerationError> {
        Err(self.0.clone())
    }
}

/// A narrative generator that panics mid-call.
#[derive(Debug)]
pub struct PanickingNarrativeGenerator;

#[async_trait]
impl NarrativeGenerator for PanickingNarrativeGenerator {
    async fn generate(
        &self,
        _context: &NarrativeContext,
    ) -> Result<NarrativeDraft, GenerationError> {
        panic!("narrative backend exploded");
    }
}

/// An art generator returning a fixed description and counting calls.
#[derive(Debug, Default)]
pub struct StaticArtGenerator {
    calls: AtomicUsize,
}

impl StaticArtGenerator {
    /// Number of `describe` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtDescriptionGenerator for StaticArtGenerator {
    async fn describe(&self, request: &ArtRequest) -> Result<ArtDescriptor, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ArtDescriptor {
            art_description: format!("A painted view of {}.", request.scene_setting),
            style_notes: "Medieval fantasy, dramatic lighting".to_owned(),
        })
    }
}

/// An art generator that always fails and counts calls.
#[derive(Debug, Default)]
pub struct FailingArtGenerator {
    calls: AtomicUsize,
}

impl FailingArtGenerator {
    /// Number of `describe` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtDescriptionGenerator for FailingArtGenerator {
    async fn describe(&self, _request: &ArtRequest) -> Result<ArtDescriptor, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::Unavailable("art service down".into()))
    }
}

/// An image generator that succeeds with a numbered URL and counts calls.
#[derive(Debug, Default)]
pub struct CountingImageGenerator {
    calls: AtomicUsize,
}

impl CountingImageGenerator {
    /// Number of `generate_image` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for CountingImageGenerator {
    async fn generate_image(&self, _art: &ArtDescriptor) -> Result<GeneratedImage, GenerationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(GeneratedImage {
            image_url: format!("https://images.test/{n}.png"),
            cached: false,
        })
    }
}

/// An image generator that always fails and counts calls.
#[derive(Debug, Default)]
pub struct FailingImageGenerator {
    calls: AtomicUsize,
}

impl FailingImageGenerator {
    /// Number of `generate_image` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for FailingImageGenerator {
    async fn generate_image(&self, _art: &ArtDescriptor) -> Result<GeneratedImage, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::Rejected {
            status: 429,
            message: "quota exceeded".into(),
        })
    }
}

/// An image generator that holds every call until [`open`] is called, then
/// answers with a fixed URL.
///
/// [`open`]: GatedImageGenerator::open
#[derive(Debug)]
pub struct GatedImageGenerator {
    gate: Semaphore,
    calls: AtomicUsize,
}

impl Default for GatedImageGenerator {
    fn default() -> Self {
        Self {
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

impl GatedImageGenerator {
    /// URL every released call answers with.
    pub const IMAGE_URL: &'static str = "https://images.test/gated.png";

    /// Releases every held and future call.
    pub fn open(&self) {
        self.gate.add_permits(1024);
    }

    /// Number of `generate_image` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for GatedImageGenerator {
    async fn generate_image(&self, _art: &ArtDescriptor) -> Result<GeneratedImage, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| GenerationError::Unavailable("gate closed".into()))?;
        Ok(GeneratedImage {
            image_url: Self::IMAGE_URL.to_owned(),
            cached: false,
        })
    }
}

/// An image generator that panics mid-call.
#[derive(Debug)]
pub struct PanickingImageGenerator;

#[async_trait]
impl ImageGenerator for PanickingImageGenerator {
    async fn generate_image(&self, _art: &ArtDescriptor) -> Result<GeneratedImage, GenerationError> {
        panic!("image backend exploded");
    }
}

/// A voice generator returning `len` bytes of silence and counting calls.
#[derive(Debug, Default)]
pub struct StaticVoiceGenerator {
    len: usize,
    calls: AtomicUsize,
}

impl StaticVoiceGenerator {
    /// Voice generator producing payloads of `len` bytes.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self {
            len,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `synthesize` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoiceGenerator for StaticVoiceGenerator {
    async fn synthesize(&self, _request: &VoiceRequest) -> Result<VoicePayload, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(VoicePayload {
            bytes: vec![0; self.len],
            content_type: "audio/mpeg".to_owned(),
        })
    }
}

/// A voice generator that always fails.
#[derive(Debug)]
pub struct FailingVoiceGenerator;

#[async_trait]
impl VoiceGenerator for FailingVoiceGenerator {
    async fn synthesize(&self, _request: &VoiceRequest) -> Result<VoicePayload, GenerationError> {
        Err(GenerationError::TimedOut("voice synthesis".into()))
    }
}

/// A generator whose calls never complete. Used to hold enrichment in
/// flight while a test cancels it.
#[derive(Debug)]
pub struct StalledGenerator;

#[async_trait]
impl ArtDescriptionGenerator for StalledGenerator {
    async fn describe(&self, _request: &ArtRequest) -> Result<ArtDescriptor, GenerationError> {
        std::future::pending().await
    }
}

#[async_trait]
impl ImageGenerator for StalledGenerator {
    async fn generate_image(&self, _art: &ArtDescriptor) -> Result<GeneratedImage, GenerationError> {
        std::future::pending().await
    }
}

#[async_trait]
impl VoiceGenerator for StalledGenerator {
    async fn synthesize(&self, _request: &VoiceRequest) -> Result<VoicePayload, GenerationError> {
        std::future::pending().await
    }
}

/// An embedding provider keyed by substring: the first keyword found in the
/// text selects its vector, anything else maps to `fallback`.
#[derive(Debug)]
pub struct StubEmbeddingProvider {
    keywords: Vec<(String, Vec<f32>)>,
    fallback: Vec<f32>,
    calls: AtomicUsize,
}

impl StubEmbeddingProvider {
    /// Creates a provider from `(keyword, vector)` pairs.
    #[must_use]
    pub fn new(keywords: HashMap<&str, Vec<f32>>, fallback: Vec<f32>) -> Self {
        let mut keywords: Vec<(String, Vec<f32>)> = keywords
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect();
        keywords.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            keywords,
            fallback,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let vector = self
            .keywords
            .iter()
            .find(|(keyword, _)| text.contains(keyword.as_str()))
            .map_or_else(|| self.fallback.clone(), |(_, v)| v.clone());
        Ok(vector)
    }
}

/// An embedding provider that always fails.
#[derive(Debug)]
pub struct FailingEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, GenerationError> {
        Err(GenerationError::Unavailable("embedding service down".into()))
    }
}
