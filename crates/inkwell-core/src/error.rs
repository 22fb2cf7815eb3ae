//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
///
/// Every variant is fatal to the request that produced it and leaves the
/// session in its last persisted state.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No session exists for the identifier.
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    /// The submitted choice was not part of the last-presented set.
    #[error("choice {choice_id:?} is not available in session {session_id}")]
    InvalidChoice {
        /// The session the choice was submitted against.
        session_id: Uuid,
        /// The rejected choice identifier.
        choice_id: String,
    },

    /// The session already reached victory or defeat.
    #[error("session {0} has already ended")]
    SessionTerminated(Uuid),

    /// The narrative generator was unreachable or returned malformed output.
    #[error("narrative generation failed: {0}")]
    UpstreamNarrative(String),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
