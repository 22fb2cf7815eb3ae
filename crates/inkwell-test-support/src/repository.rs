//! Event store doubles.

use std::sync::Mutex;

use async_trait::async_trait;
use inkwell_core::error::DomainError;
use inkwell_core::repository::{EventRepository, StoredEvent};
use uuid::Uuid;

/// One `append_events` call seen by [`RecordingEventRepository`].
#[derive(Debug, Clone)]
pub struct AppendCall {
    /// Stream appended to.
    pub aggregate_id: Uuid,
    /// Version the caller expected the stream to be at.
    pub expected_version: i64,
    /// Rows handed over.
    pub events: Vec<StoredEvent>,
}

/// Serves a fixed stream and records appends without applying them.
#[derive(Debug)]
pub struct RecordingEventRepository {
    stream: Vec<StoredEvent>,
    appends: Mutex<Vec<AppendCall>>,
}

impl RecordingEventRepository {
    /// Serves `stream` for every session id.
    #[must_use]
    pub fn new(stream: Vec<StoredEvent>) -> Self {
        Self {
            stream,
            appends: Mutex::new(Vec::new()),
        }
    }

    /// Appends seen so far, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appends(&self) -> Vec<AppendCall> {
        self.appends.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.stream.clone())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.appends.lock().unwrap().push(AppendCall {
            aggregate_id,
            expected_version,
            events: events.to_vec(),
        });
        Ok(())
    }
}

/// Knows no session and accepts every append.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(Vec::new())
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Serves a fixed stream but loses every append race, as if another
/// request advanced the session first.
#[derive(Debug)]
pub struct ConflictingEventRepository {
    stream: Vec<StoredEvent>,
}

impl ConflictingEventRepository {
    /// Serves `stream` for every session id.
    #[must_use]
    pub fn new(stream: Vec<StoredEvent>) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl EventRepository for ConflictingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.stream.clone())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Err(DomainError::ConcurrencyConflict {
            aggregate_id,
            expected: expected_version,
            actual: expected_version + 1,
        })
    }
}

/// Fails every call with an infrastructure error.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("event store offline".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("event store offline".into()))
    }
}
