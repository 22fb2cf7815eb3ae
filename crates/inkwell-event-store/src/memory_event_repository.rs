//! In-process implementation of the `EventRepository` trait.
//!
//! Used when no database is configured. Sessions live as long as the
//! process does.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use inkwell_core::error::DomainError;
use inkwell_core::repository::{EventRepository, StoredEvent};

/// Event repository backed by a map of in-memory streams.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    streams: RwLock<HashMap<Uuid, Vec<StoredEvent>>>,
}

impl InMemoryEventRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of streams currently held.
    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .streams
            .read()
            .await
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }

        // The write lock is held across the version check and the append, so
        // two writers racing on one session cannot both succeed.
        let mut streams = self.streams.write().await;
        let actual = streams
            .get(&aggregate_id)
            .and_then(|stream| stream.last())
            .map_or(0, |e| e.sequence_number);

        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }

        streams
            .entry(aggregate_id)
            .or_default()
            .extend_from_slice(events);
        Ok(())
    }
}
