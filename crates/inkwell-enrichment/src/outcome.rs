//! Enrichment outcome values and their per-turn aggregation.

use std::fmt;

use inkwell_core::generator::{ArtDescriptor, GeneratedImage, GenerationError, VoicePayload};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of the art description step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtOutcome {
    /// The scene was described.
    Ready(ArtDescriptor),
    /// No art was requested for this turn.
    Skipped,
    /// The generator failed.
    Failed {
        /// Failure detail.
        reason: String,
    },
    /// The turn was abandoned before the description arrived.
    Cancelled,
}

impl ArtOutcome {
    /// The descriptor, when ready.
    #[must_use]
    pub fn descriptor(&self) -> Option<&ArtDescriptor> {
        match self {
            Self::Ready(art) => Some(art),
            _ => None,
        }
    }

    /// Whether the generator was called and failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl From<&GenerationError> for ArtOutcome {
    fn from(error: &GenerationError) -> Self {
        Self::Failed {
            reason: error.to_string(),
        }
    }
}

/// Result of the image step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageOutcome {
    /// The image was generated or served from cache.
    Ready(GeneratedImage),
    /// No image was attempted, either because no art was requested or
    /// because the art description failed.
    Skipped,
    /// The generator failed.
    Failed {
        /// Failure detail.
        reason: String,
    },
    /// The turn was abandoned before the image arrived.
    Cancelled,
}

impl ImageOutcome {
    /// The image, when ready.
    #[must_use]
    pub fn image(&self) -> Option<&GeneratedImage> {
        match self {
            Self::Ready(image) => Some(image),
            _ => None,
        }
    }

    /// Whether the generator was called and failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl From<&GenerationError> for ImageOutcome {
    fn from(error: &GenerationError) -> Self {
        Self::Failed {
            reason: error.to_string(),
        }
    }
}

/// Result of voice synthesis. Never skipped: every turn is voiced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOutcome {
    /// Audio is available.
    Ready(VoicePayload),
    /// The generator failed or returned a degenerate payload.
    Failed {
        /// Failure detail.
        reason: String,
    },
    /// The turn was abandoned before the audio arrived.
    Cancelled,
}

impl VoiceOutcome {
    /// The audio, when ready.
    #[must_use]
    pub fn payload(&self) -> Option<&VoicePayload> {
        match self {
            Self::Ready(payload) => Some(payload),
            _ => None,
        }
    }

    /// Wire name of the outcome.
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::Failed { .. } => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Failure detail, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

impl From<&GenerationError> for VoiceOutcome {
    fn from(error: &GenerationError) -> Self {
        Self::Failed {
            reason: error.to_string(),
        }
    }
}

/// Identifies the turn an enrichment result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnrichmentTag {
    /// Session the turn belongs to.
    pub session_id: Uuid,
    /// Turn number within the session.
    pub turn_number: u32,
}

/// One resolved enrichment step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentKind {
    /// Art description resolved.
    Art(ArtOutcome),
    /// Image resolved.
    Image(ImageOutcome),
    /// Voice resolved.
    Voice(VoiceOutcome),
}

/// A resolved enrichment step, tagged with its turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentUpdate {
    /// Turn the update belongs to.
    pub tag: EnrichmentTag,
    /// What resolved.
    pub kind: EnrichmentKind,
}

/// Non-blocking message shown to the player when enrichment degrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentNotice {
    /// No image will be shown for this turn.
    ImageUnavailable,
    /// No voice will be played for this turn.
    VoiceUnavailable,
}

impl fmt::Display for EnrichmentNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageUnavailable => f.write_str("image unavailable"),
            Self::VoiceUnavailable => f.write_str("voice unavailable"),
        }
    }
}

/// Aggregated enrichment of one turn. A `None` slot is still pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentReport {
    /// Turn the report belongs to.
    pub tag: EnrichmentTag,
    /// Art description outcome.
    pub art: Option<ArtOutcome>,
    /// Image outcome.
    pub image: Option<ImageOutcome>,
    /// Voice outcome.
    pub voice: Option<VoiceOutcome>,
}

impl EnrichmentReport {
    /// A report with nothing resolved yet. Without art the visual slots are
    /// settled as skipped from the start.
    #[must_use]
    pub fn pending(tag: EnrichmentTag, include_art: bool) -> Self {
        let (art, image) = if include_art {
            (None, None)
        } else {
            (Some(ArtOutcome::Skipped), Some(ImageOutcome::Skipped))
        };
        Self {
            tag,
            art,
            image,
            voice: None,
        }
    }

    /// Records a resolved step.
    pub fn record(&mut self, kind: EnrichmentKind) {
        match kind {
            EnrichmentKind::Art(outcome) => self.art = Some(outcome),
            EnrichmentKind::Image(outcome) => self.image = Some(outcome),
            EnrichmentKind::Voice(outcome) => self.voice = Some(outcome),
        }
    }

    /// Whether the art and image slots are resolved.
    #[must_use]
    pub fn visuals_settled(&self) -> bool {
        self.art.is_some() && self.image.is_some()
    }

    /// Whether every slot is resolved.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.art.is_some() && self.image.is_some() && self.voice.is_some()
    }

    /// Marks every pending slot as cancelled.
    #[must_use]
    pub fn settle_cancelled(mut self) -> Self {
        self.art.get_or_insert(ArtOutcome::Cancelled);
        self.image.get_or_insert(ImageOutcome::Cancelled);
        self.voice.get_or_insert(VoiceOutcome::Cancelled);
        self
    }

    /// Notices for degraded enrichment. Cancelled and pending slots produce
    /// none.
    #[must_use]
    pub fn notices(&self) -> Vec<EnrichmentNotice> {
        let mut notices = Vec::new();
        let art_failed = self.art.as_ref().is_some_and(ArtOutcome::is_failed);
        let image_failed = self.image.as_ref().is_some_and(ImageOutcome::is_failed);
        if art_failed || image_failed {
            notices.push(EnrichmentNotice::ImageUnavailable);
        }
        if matches!(self.voice, Some(VoiceOutcome::Failed { .. })) {
            notices.push(EnrichmentNotice::VoiceUnavailable);
        }
        notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag() -> EnrichmentTag {
        EnrichmentTag {
            session_id: Uuid::new_v4(),
            turn_number: 2,
        }
    }

    #[test]
    fn test_pending_report_without_art_settles_visual_slots_as_skipped() {
        // Arrange
        let tag = tag();

        // Act
        let report = EnrichmentReport::pending(tag, false);

        // Assert
        assert_eq!(report.art, Some(ArtOutcome::Skipped));
        assert_eq!(report.image, Some(ImageOutcome::Skipped));
        assert!(report.voice.is_none());
        assert!(!report.is_settled());
    }

    #[test]
    fn test_art_failure_yields_image_unavailable_notice() {
        // Arrange
        let mut report = EnrichmentReport::pending(tag(), true);

        // Act
        report.record(EnrichmentKind::Art(ArtOutcome::Failed {
            reason: "down".into(),
        }));
        report.record(EnrichmentKind::Image(ImageOutcome::Skipped));

        // Assert
        assert_eq!(report.notices(), vec![EnrichmentNotice::ImageUnavailable]);
    }

    #[test]
    fn test_cancelled_slots_produce_no_notices() {
        // Arrange
        let mut report = EnrichmentReport::pending(tag(), true);
        report.record(EnrichmentKind::Voice(VoiceOutcome::Failed {
            reason: "timeout".into(),
        }));

        // Act
        let settled = report.settle_cancelled();

        // Assert
        assert!(settled.is_settled());
        assert_eq!(settled.art, Some(ArtOutcome::Cancelled));
        assert_eq!(settled.image, Some(ImageOutcome::Cancelled));
        assert_eq!(settled.notices(), vec![EnrichmentNotice::VoiceUnavailable]);
    }

    #[test]
    fn test_outcomes_serialize_with_status_tag() {
        let ready = ImageOutcome::Ready(GeneratedImage {
            image_url: "https://images.test/1.png".into(),
            cached: true,
        });
        let failed = ArtOutcome::Failed {
            reason: "quota".into(),
        };

        assert_eq!(
            serde_json::to_value(&ready).unwrap(),
            serde_json::json!({
                "status": "ready",
                "image_url": "https://images.test/1.png",
                "cached": true
            })
        );
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            serde_json::json!({ "status": "failed", "reason": "quota" })
        );
        assert_eq!(EnrichmentNotice::VoiceUnavailable.to_string(), "voice unavailable");
    }
}
