//! Domain events and their envelope metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repository::StoredEvent;

/// Envelope metadata recorded with every session event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Type name used to route the payload on load.
    pub event_type: String,
    /// Session stream the event belongs to.
    pub aggregate_id: Uuid,
    /// Position in the stream, starting at 1.
    pub sequence_number: i64,
    /// Request that produced the event.
    pub correlation_id: Uuid,
    /// Event or command that caused this one.
    pub causation_id: Uuid,
    /// When the event was recorded.
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    /// Metadata for a new event caused directly by the request
    /// `correlation_id`.
    #[must_use]
    pub fn record(
        event_type: &str,
        aggregate_id: Uuid,
        sequence_number: i64,
        correlation_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event_type.to_owned(),
            aggregate_id,
            sequence_number,
            correlation_id,
            causation_id: correlation_id,
            occurred_at,
        }
    }
}

impl From<&StoredEvent> for EventMetadata {
    fn from(stored: &StoredEvent) -> Self {
        Self {
            event_id: stored.event_id,
            event_type: stored.event_type.clone(),
            aggregate_id: stored.aggregate_id,
            sequence_number: stored.sequence_number,
            correlation_id: stored.correlation_id,
            causation_id: stored.causation_id,
            occurred_at: stored.occurred_at,
        }
    }
}

/// A recorded fact about a session.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Type name of the payload.
    fn event_type(&self) -> &'static str;

    /// Payload as JSON.
    fn to_payload(&self) -> serde_json::Value;

    /// Envelope metadata.
    fn metadata(&self) -> &EventMetadata;

    /// The row written to the event store.
    fn to_stored(&self) -> StoredEvent {
        let meta = self.metadata();
        StoredEvent {
            event_id: meta.event_id,
            aggregate_id: meta.aggregate_id,
            event_type: self.event_type().to_owned(),
            payload: self.to_payload(),
            sequence_number: meta.sequence_number,
            correlation_id: meta.correlation_id,
            causation_id: meta.causation_id,
            occurred_at: meta.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[derive(Debug)]
    struct Marker(EventMetadata);

    impl DomainEvent for Marker {
        fn event_type(&self) -> &'static str {
            "test.marker"
        }

        fn to_payload(&self) -> serde_json::Value {
            serde_json::json!({ "marker": true })
        }

        fn metadata(&self) -> &EventMetadata {
            &self.0
        }
    }

    #[test]
    fn test_recorded_metadata_is_caused_by_its_request() {
        // Arrange
        let session_id = Uuid::new_v4();
        let correlation_id = Uuid::new_v4();
        let at = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();

        // Act
        let meta = EventMetadata::record("test.marker", session_id, 3, correlation_id, at);

        // Assert
        assert_eq!(meta.causation_id, correlation_id);
        assert_eq!(meta.sequence_number, 3);
        assert_eq!(meta.occurred_at, at);
        assert_ne!(meta.event_id, correlation_id);
    }

    #[test]
    fn test_stored_row_restores_the_same_metadata() {
        let meta = EventMetadata::record("test.marker", Uuid::new_v4(), 1, Uuid::new_v4(), Utc::now());
        let event = Marker(meta.clone());

        let stored = event.to_stored();

        assert_eq!(stored.payload, serde_json::json!({ "marker": true }));
        assert_eq!(EventMetadata::from(&stored), meta);
    }
}
