//! Event-sourced aggregate abstraction.

use uuid::Uuid;

use crate::event::DomainEvent;

/// State rebuilt by folding its event stream.
pub trait AggregateRoot: Send + Sync {
    /// Events this aggregate records and replays.
    type Event: DomainEvent;

    /// Stream identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Number of persisted events folded in so far. Appends are accepted
    /// only while the stream head still equals this value.
    fn version(&self) -> i64;

    /// Folds one event into the state.
    fn apply(&mut self, event: &Self::Event);

    /// Events recorded since the last load and not yet persisted.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Forgets the recorded events once they are persisted.
    fn clear_uncommitted_events(&mut self);

    /// Rows to append for the recorded events.
    fn pending_rows(&self) -> Vec<crate::repository::StoredEvent> {
        self.uncommitted_events()
            .iter()
            .map(DomainEvent::to_stored)
            .collect()
    }
}
