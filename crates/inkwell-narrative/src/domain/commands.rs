//! Commands for the Turn Orchestration context.

use inkwell_core::command::Command;
use uuid::Uuid;

/// Command to open a new session with its first scene.
#[derive(Debug, Clone)]
pub struct StartGame {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Identifier assigned to the new session.
    pub session_id: Uuid,
}

impl Command for StartGame {
    fn command_type(&self) -> &'static str {
        "game.start"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn session_id(&self) -> Uuid {
        self.session_id
    }
}

/// Command to submit a choice for the current turn.
#[derive(Debug, Clone)]
pub struct ContinueGame {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session to advance.
    pub session_id: Uuid,
    /// Identifier of the picked choice.
    pub choice_id: String,
}

impl Command for ContinueGame {
    fn command_type(&self) -> &'static str {
        "game.continue"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn session_id(&self) -> Uuid {
        self.session_id
    }
}
