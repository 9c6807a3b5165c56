//! Event-folding contract for documents kept in the order store.

use common::OrderId;
use order_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// A fact recorded against an order.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Name used in logs.
    fn event_type(&self) -> &'static str;
}

/// State rebuilt by folding events.
///
/// Commands validate against the current state and return events; `apply`
/// folds them. Only the folded state is persisted, as one document whose
/// store version travels with the in-memory copy so the next write can be
/// a compare-and-swap.
pub trait Aggregate: Default + Clone + Send + Sync + Sized {
    type Event: DomainEvent;
    type Error: std::error::Error + Send + Sync;

    /// None until the placement event has been applied.
    fn id(&self) -> Option<OrderId>;

    /// Version of the stored document this state was read from.
    fn version(&self) -> Version;

    fn set_version(&mut self, version: Version);

    /// Folds one accepted event. Never fails.
    fn apply(&mut self, event: Self::Event);

    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }
}
