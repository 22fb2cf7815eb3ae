//! Game state transitions.
//!
//! Turns a raw [`NarrativeDraft`] into the next game state. The generator's
//! terminal flags win over every heuristic; the turn limit only applies when
//! the generator left the story open.

use std::collections::HashSet;

use inkwell_core::error::DomainError;
use inkwell_core::generator::NarrativeDraft;
use inkwell_core::story::{CharacterStanding, Choice, GameStatus, ProtagonistStatus};
use serde::{Deserialize, Serialize};

use super::policy::TurnLimitPolicy;

/// What ended a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndingReason {
    /// The narrative generator declared victory or defeat.
    NarrativeSignal,
    /// The turn limit forced a defeat.
    TurnLimitReached,
}

/// The outcome of a turn, as presented to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResult {
    /// Turn count after this turn; `0` for the opening scene.
    pub turn_number: u32,
    /// Story text.
    pub narrative: String,
    /// Location label.
    pub scene_setting: String,
    /// Whether the location differs from the previous turn.
    pub scene_changed: bool,
    /// Choices for the next turn; empty when the story ended.
    pub choices: Vec<Choice>,
    /// Character standings after the turn.
    pub characters: Vec<CharacterStanding>,
    /// Session status after the turn.
    pub status: GameStatus,
    /// Whether the story ended.
    pub game_over: bool,
    /// Whether it ended in victory.
    pub victory: bool,
    /// What ended the story, if it ended.
    pub ending_reason: Option<EndingReason>,
}

/// A validated draft with its terminal state decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTurn {
    /// Story text, with the policy epilogue when the limit ended it.
    pub narrative: String,
    /// Trimmed location label.
    pub scene_setting: String,
    /// Next choices; empty when terminal.
    pub choices: Vec<Choice>,
    /// Character updates; `None` keeps the previous standings.
    pub characters: Option<Vec<CharacterStanding>>,
    /// Protagonist update; `None` keeps the previous status.
    pub protagonist: Option<ProtagonistStatus>,
    /// Plot points reported by the generator.
    pub key_events: Vec<String>,
    /// Resulting status.
    pub status: GameStatus,
    /// Why the story ended, when terminal.
    pub ending_reason: Option<EndingReason>,
}

fn malformed(detail: &str) -> DomainError {
    DomainError::UpstreamNarrative(format!("malformed narrative draft: {detail}"))
}

fn validate_choices(choices: &[Choice]) -> Result<(), DomainError> {
    if choices.is_empty() {
        return Err(malformed("an open story needs at least one choice"));
    }
    let mut seen = HashSet::new();
    for choice in choices {
        if choice.id.trim().is_empty() {
            return Err(malformed("choice with an empty id"));
        }
        if !seen.insert(choice.id.as_str()) {
            return Err(malformed(&format!("duplicate choice id {:?}", choice.id)));
        }
    }
    Ok(())
}

/// Validates `draft` as turn `turn_number` and decides its status.
///
/// # Errors
///
/// Returns `DomainError::UpstreamNarrative` when the draft has an empty
/// narrative or scene setting, or when an open story carries no choices,
/// an empty choice id, or duplicate choice ids.
pub fn resolve_draft(
    draft: NarrativeDraft,
    turn_number: u32,
    policy: TurnLimitPolicy,
) -> Result<ResolvedTurn, DomainError> {
    if draft.narrative.trim().is_empty() {
        return Err(malformed("empty narrative"));
    }
    let scene_setting = draft.scene_setting.trim().to_owned();
    if scene_setting.is_empty() {
        return Err(malformed("empty scene setting"));
    }

    let signalled = if draft.victory {
        Some(GameStatus::Victory)
    } else if draft.game_over {
        Some(GameStatus::Defeat)
    } else {
        None
    };

    let (narrative, choices, status, ending_reason) = match signalled {
        Some(status) => (
            draft.narrative,
            Vec::new(),
            status,
            Some(EndingReason::NarrativeSignal),
        ),
        None if policy.is_reached(turn_number) => (
            policy.with_epilogue(&draft.narrative),
            Vec::new(),
            GameStatus::Defeat,
            Some(EndingReason::TurnLimitReached),
        ),
        None => {
            validate_choices(&draft.choices)?;
            (draft.narrative, draft.choices, GameStatus::Active, None)
        }
    };

    Ok(ResolvedTurn {
        narrative,
        scene_setting,
        choices,
        characters: draft.characters,
        protagonist: draft.protagonist,
        key_events: draft.key_events,
        status,
        ending_reason,
    })
}

/// Whether `next` is a different location than `previous`. Comparison
/// ignores surrounding whitespace and case; no previous scene always counts
/// as a change.
#[must_use]
pub fn scene_changed(previous: Option<&str>, next: &str) -> bool {
    previous.is_none_or(|previous| !previous.trim().eq_ignore_ascii_case(next.trim()))
}

/// The entries of `incoming` not yet in `known`, in order, without
/// duplicates or blanks.
#[must_use]
pub fn new_key_events(known: &[String], incoming: &[String]) -> Vec<String> {
    let mut fresh: Vec<String> = Vec::new();
    for event in incoming {
        let event = event.trim();
        if event.is_empty() || known.iter().any(|k| k == event) || fresh.iter().any(|f| f == event)
        {
            continue;
        }
        fresh.push(event.to_owned());
    }
    fresh
}
