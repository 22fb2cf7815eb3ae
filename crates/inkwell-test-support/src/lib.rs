//! Shared test doubles for the Inkwell visual-novel gateway.

mod clock;
mod generators;
mod repository;

pub use clock::FixedClock;
pub use generators::{
    CountingImageGenerator, FailingArtGenerator, FailingEmbeddingProvider,
    FailingImageGenerator, FailingNarrativeGenerator, FailingVoiceGenerator,
    GatedImageGenerator, PanickingImageGenerator, PanickingNarrativeGenerator, ScriptedNarrativeGenerator, StalledGenerator, StaticArtGenerator,
    StaticVoiceGenerator, StubEmbeddingProvider, choice, draft, terminal_draft,
};
pub use repository::{
    AppendCall, ConflictingEventRepository, EmptyEventRepository, FailingEventRepository,
    RecordingEventRepository,
};
