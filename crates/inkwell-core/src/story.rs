//! Story value types shared by the session, the generators and the gateway.

use serde::{Deserialize, Serialize};

/// Upper bound of a character's trust level.
pub const MAX_TRUST_LEVEL: u8 = 10;

/// How dangerous a presented choice is.
///
/// Read case-insensitively; anything unrecognised reads as `Medium`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum RiskLevel {
    /// Safe option.
    Low,
    /// Some danger.
    #[default]
    Medium,
    /// Likely to backfire.
    High,
}

/// A decision offered to the player. Immutable once presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Identifier, unique within the turn's choice set.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Risk level.
    #[serde(default)]
    pub risk_level: RiskLevel,
}

/// How threatening a tracked character is to the protagonist.
///
/// Read the same lenient way as [`RiskLevel`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ThreatLevel {
    /// Harmless.
    Low,
    /// Worth watching.
    #[default]
    Medium,
    /// Actively dangerous.
    High,
}

fn normalized(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

impl From<String> for RiskLevel {
    fn from(name: String) -> Self {
        match normalized(&name).as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }
}

impl From<String> for ThreatLevel {
    fn from(name: String) -> Self {
        match normalized(&name).as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }
}

/// Relationship state for one tracked character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStanding {
    /// Character name.
    pub name: String,
    /// Trust towards the protagonist, `0..=MAX_TRUST_LEVEL`.
    pub trust_level: u8,
    /// Threat posed to the protagonist.
    pub threat_level: ThreatLevel,
}

impl CharacterStanding {
    /// Creates a standing, clamping `trust_level` into range.
    #[must_use]
    pub fn new(name: impl Into<String>, trust_level: i64, threat_level: ThreatLevel) -> Self {
        let clamped = trust_level.clamp(0, i64::from(MAX_TRUST_LEVEL));
        Self {
            name: name.into(),
            trust_level: u8::try_from(clamped).unwrap_or(MAX_TRUST_LEVEL),
            threat_level,
        }
    }
}

/// Where the protagonist stands in the story.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtagonistStatus {
    /// Current location.
    pub location: String,
    /// Characters currently helping.
    #[serde(default)]
    pub allies: Vec<String>,
    /// Items or knowledge gathered.
    #[serde(default)]
    pub resources: Vec<String>,
    /// Free-form physical condition ("healthy", "wounded", ...).
    #[serde(default)]
    pub physical_state: String,
}

/// Lifecycle status of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Choices are still accepted.
    Active,
    /// The protagonist won.
    Victory,
    /// The protagonist lost.
    Defeat,
}

impl GameStatus {
    /// Whether the session accepts no further choices.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }
}
