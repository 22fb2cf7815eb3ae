//! Session store port.
//!
//! A game session is persisted as the ordered stream of events recorded
//! against its identifier. Nothing else about a session is stored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;

/// One row of a session stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Session the row belongs to.
    pub aggregate_id: Uuid,
    /// Payload type, e.g. `game.turn_advanced`.
    pub event_type: String,
    /// JSON payload.
    pub payload: serde_json::Value,
    /// Position in the stream, starting at 1.
    pub sequence_number: i64,
    /// Request that produced the row.
    pub correlation_id: Uuid,
    /// Event or command that caused the row.
    pub causation_id: Uuid,
    /// When the event was recorded.
    pub occurred_at: DateTime<Utc>,
}

/// Loads and appends session streams.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// The whole stream of `aggregate_id`, oldest first. Unknown sessions
    /// yield an empty stream.
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError>;

    /// Appends `events` after position `expected_version`, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` when another writer moved
    /// the stream past `expected_version` first, and
    /// `DomainError::Infrastructure` when the store fails.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError>;
}
