//! Commands addressed to a game session.

use uuid::Uuid;

/// A request to change one session.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Name used in logs, e.g. `game.start`.
    fn command_type(&self) -> &'static str;

    /// Request the command was issued for.
    fn correlation_id(&self) -> Uuid;

    /// Session the command targets.
    fn session_id(&self) -> Uuid;
}
