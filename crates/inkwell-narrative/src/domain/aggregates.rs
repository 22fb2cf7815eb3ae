//! Aggregate roots for the Turn Orchestration context.

use inkwell_core::aggregate::AggregateRoot;
use inkwell_core::clock::Clock;
use inkwell_core::error::DomainError;
use inkwell_core::event::EventMetadata;
use inkwell_core::generator::{ChosenAction, NarrativeContext, NarrativeDraft};
use inkwell_core::story::{CharacterStanding, Choice, GameStatus, ProtagonistStatus};
use serde::Serialize;
use uuid::Uuid;

use super::events::{GameEnded, GameEvent, GameEventKind, GameStarted, TurnAdvanced};
use super::policy::TurnLimitPolicy;
use super::transitions::{
    EndingReason, ResolvedTurn, TurnResult, new_key_events, resolve_draft, scene_changed,
};

/// Lifecycle phase of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Created, opening scene not yet accepted.
    AwaitingStart,
    /// Accepting choices.
    Active,
    /// Ended in victory.
    Victory,
    /// Ended in defeat.
    Defeat,
}

impl SessionPhase {
    /// Public status of the phase. A session awaiting its start is reported
    /// as active.
    #[must_use]
    pub fn status(self) -> GameStatus {
        match self {
            Self::AwaitingStart | Self::Active => GameStatus::Active,
            Self::Victory => GameStatus::Victory,
            Self::Defeat => GameStatus::Defeat,
        }
    }
}

/// The aggregate root for one play-through.
#[derive(Debug)]
pub struct GameSession {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Lifecycle phase.
    pub(crate) phase: SessionPhase,
    /// Accepted choices so far.
    pub(crate) turn_count: u32,
    /// Every narrative shown, oldest first.
    pub(crate) history: Vec<String>,
    /// Current scene setting.
    pub(crate) scene_setting: Option<String>,
    /// Tracked characters.
    pub(crate) characters: Vec<CharacterStanding>,
    /// Protagonist status.
    pub(crate) protagonist: ProtagonistStatus,
    /// Accumulated plot points.
    pub(crate) key_events: Vec<String>,
    /// Choices offered on the current turn.
    pub(crate) presented_choices: Vec<Choice>,
    /// What ended the story, once ended.
    pub(crate) ending_reason: Option<EndingReason>,
    policy: TurnLimitPolicy,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<GameEvent>,
}

impl GameSession {
    /// Creates a session awaiting its opening scene.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            phase: SessionPhase::AwaitingStart,
            turn_count: 0,
            history: Vec::new(),
            scene_setting: None,
            characters: Vec::new(),
            protagonist: ProtagonistStatus::default(),
            key_events: Vec::new(),
            presented_choices: Vec::new(),
            ending_reason: None,
            policy: TurnLimitPolicy::default(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Accepted choices so far.
    #[must_use]
    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// Whether the session accepts no more choices.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.phase.status().is_terminal()
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(&mut self, kind: GameEventKind, event_type: &str, correlation_id: Uuid, clock: &dyn Clock) {
        let event = GameEvent {
            metadata: EventMetadata::record(
                event_type,
                self.id,
                self.next_sequence_number(),
                correlation_id,
                clock.now(),
            ),
            kind,
        };
        self.uncommitted_events.push(event);
    }

    fn record_ending(&mut self, resolved: &ResolvedTurn, correlation_id: Uuid, clock: &dyn Clock) {
        if let Some(reason) = resolved.ending_reason {
            let ended = GameEnded {
                session_id: self.id,
                status: resolved.status,
                reason,
            };
            self.record(GameEventKind::GameEnded(ended), "game.ended", correlation_id, clock);
        }
    }

    /// Context for generating the opening scene.
    #[must_use]
    pub fn opening_context(&self) -> NarrativeContext {
        NarrativeContext {
            session_id: self.id,
            turn_number: 0,
            max_turns: self.policy.max_turns(),
            scene_setting: None,
            current_narrative: None,
            history: Vec::new(),
            characters: Vec::new(),
            protagonist: ProtagonistStatus::default(),
            key_events: Vec::new(),
            chosen_action: None,
        }
    }

    /// Checks that `choice_id` may be submitted now and returns the choice.
    /// A terminal session is rejected before the choice is looked at.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionNotFound` if the session never started,
    /// `DomainError::SessionTerminated` if it has ended, and
    /// `DomainError::InvalidChoice` if the id was not presented.
    pub fn ensure_can_advance(&self, choice_id: &str) -> Result<&Choice, DomainError> {
        match self.phase {
            SessionPhase::AwaitingStart => return Err(DomainError::SessionNotFound(self.id)),
            SessionPhase::Victory | SessionPhase::Defeat => {
                return Err(DomainError::SessionTerminated(self.id));
            }
            SessionPhase::Active => {}
        }
        self.presented_choices
            .iter()
            .find(|choice| choice.id == choice_id)
            .ok_or_else(|| DomainError::InvalidChoice {
                session_id: self.id,
                choice_id: choice_id.to_owned(),
            })
    }

    /// Context for generating the turn that follows `chosen`.
    #[must_use]
    pub fn next_context(&self, chosen: &Choice) -> NarrativeContext {
        NarrativeContext {
            session_id: self.id,
            turn_number: self.turn_count + 1,
            max_turns: self.policy.max_turns(),
            scene_setting: self.scene_setting.clone(),
            current_narrative: self.history.last().cloned(),
            history: self.history.clone(),
            characters: self.characters.clone(),
            protagonist: self.protagonist.clone(),
            key_events: self.key_events.clone(),
            chosen_action: Some(ChosenAction {
                id: chosen.id.clone(),
                description: chosen.description.clone(),
            }),
        }
    }

    /// Accepts the opening scene, producing `GameStarted` (and `GameEnded`
    /// if the story ends immediately).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the session already started and
    /// `DomainError::UpstreamNarrative` if the draft is malformed.
    pub fn start(
        &mut self,
        draft: NarrativeDraft,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<TurnResult, DomainError> {
        if self.phase != SessionPhase::AwaitingStart {
            return Err(DomainError::Validation(format!(
                "session {} has already started",
                self.id
            )));
        }
        let resolved = resolve_draft(draft, 0, self.policy)?;
        let characters = resolved.characters.clone().unwrap_or_default();

        let started = GameStarted {
            session_id: self.id,
            narrative: resolved.narrative.clone(),
            scene_setting: resolved.scene_setting.clone(),
            choices: resolved.choices.clone(),
            characters: characters.clone(),
            protagonist: resolved.protagonist.clone().unwrap_or_default(),
            key_events: new_key_events(&[], &resolved.key_events),
        };
        self.record(GameEventKind::GameStarted(started), "game.started", correlation_id, clock);
        self.record_ending(&resolved, correlation_id, clock);

        Ok(turn_result(0, true, characters, resolved))
    }

    /// Accepts `choice_id` and the draft generated for it, producing
    /// `TurnAdvanced` (and `GameEnded` when the story ends on this turn).
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::ensure_can_advance`], or
    /// `DomainError::UpstreamNarrative` if the draft is malformed.
    pub fn advance(
        &mut self,
        choice_id: &str,
        draft: NarrativeDraft,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<TurnResult, DomainError> {
        self.ensure_can_advance(choice_id)?;
        let turn_number = self.turn_count + 1;
        let resolved = resolve_draft(draft, turn_number, self.policy)?;

        let changed = scene_changed(self.scene_setting.as_deref(), &resolved.scene_setting);
        let characters = resolved
            .characters
            .clone()
            .unwrap_or_else(|| self.characters.clone());

        let advanced = TurnAdvanced {
            session_id: self.id,
            turn_number,
            choice_id: choice_id.to_owned(),
            narrative: resolved.narrative.clone(),
            scene_setting: resolved.scene_setting.clone(),
            choices: resolved.choices.clone(),
            characters: characters.clone(),
            protagonist: resolved
                .protagonist
                .clone()
                .unwrap_or_else(|| self.protagonist.clone()),
            key_events: new_key_events(&self.key_events, &resolved.key_events),
        };
        self.record(
            GameEventKind::TurnAdvanced(advanced),
            "game.turn_advanced",
            correlation_id,
            clock,
        );
        self.record_ending(&resolved, correlation_id, clock);

        Ok(turn_result(turn_number, changed, characters, resolved))
    }
}

fn turn_result(
    turn_number: u32,
    scene_changed: bool,
    characters: Vec<CharacterStanding>,
    resolved: ResolvedTurn,
) -> TurnResult {
    let game_over = resolved.status.is_terminal();
    TurnResult {
        turn_number,
        narrative: resolved.narrative,
        scene_setting: resolved.scene_setting,
        scene_changed,
        choices: resolved.choices,
        characters,
        status: resolved.status,
        game_over,
        victory: resolved.status == GameStatus::Victory,
        ending_reason: resolved.ending_reason,
    }
}

impl AggregateRoot for GameSession {
    type Event = GameEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            GameEventKind::GameStarted(payload) => {
                self.phase = SessionPhase::Active;
                self.turn_count = 0;
                self.history.push(payload.narrative.clone());
                self.scene_setting = Some(payload.scene_setting.clone());
                self.presented_choices.clone_from(&payload.choices);
                self.characters.clone_from(&payload.characters);
                self.protagonist = payload.protagonist.clone();
                self.key_events.extend(payload.key_events.iter().cloned());
            }
            GameEventKind::TurnAdvanced(payload) => {
                self.turn_count = payload.turn_number;
                self.history.push(payload.narrative.clone());
                self.scene_setting = Some(payload.scene_setting.clone());
                self.presented_choices.clone_from(&payload.choices);
                self.characters.clone_from(&payload.characters);
                self.protagonist = payload.protagonist.clone();
                self.key_events.extend(payload.key_events.iter().cloned());
            }
            GameEventKind::GameEnded(payload) => {
                self.phase = match payload.status {
                    GameStatus::Victory => SessionPhase::Victory,
                    GameStatus::Defeat | GameStatus::Active => SessionPhase::Defeat,
                };
                self.ending_reason = Some(payload.reason);
                self.presented_choices.clear();
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
