//! Live change feed.
//!
//! Every committed write replaces the published collection state. A
//! [`Subscription`] only ever sees the latest state, so a slow subscriber
//! skips intermediate snapshots instead of queueing them.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_core::Stream;
use tokio::sync::watch;

use crate::{OrderQuery, OrderRecord, Result, StoreError};

/// Full collection state as of one committed write.
#[derive(Debug, Clone, Default)]
pub struct CollectionState {
    /// Monotonic write counter of the store.
    pub revision: u64,
    /// Every order document in the store.
    pub records: Vec<OrderRecord>,
}

/// The subset of the collection matching a subscription's query.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub revision: u64,
    pub records: Vec<OrderRecord>,
}

/// A stream of feed snapshots.
pub type FeedStream = Pin<Box<dyn Stream<Item = Result<FeedSnapshot>> + Send>>;

/// Publishing side of the feed, owned by a store implementation.
#[derive(Clone)]
pub struct FeedPublisher {
    sender: Arc<watch::Sender<Arc<CollectionState>>>,
}

impl Default for FeedPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedPublisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Arc::new(CollectionState::default()));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Replaces the published state and wakes every subscriber.
    pub fn publish(&self, state: CollectionState) {
        self.sender.send_replace(Arc::new(state));
    }

    /// Wakes every subscriber without changing the state.
    pub fn notify(&self) {
        self.sender.send_modify(|_| {});
    }

    /// Number of open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Opens a subscription filtered by `query`.
    ///
    /// While `unavailable` is set the subscription yields
    /// `StoreError::Unavailable` instead of snapshots.
    pub fn subscribe(&self, query: OrderQuery, unavailable: Arc<AtomicBool>) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
            query,
            unavailable,
            primed: false,
        }
    }
}

/// A live, filtered view over the store.
///
/// Dropping the subscription (or calling [`Subscription::unsubscribe`])
/// stops delivery.
pub struct Subscription {
    receiver: watch::Receiver<Arc<CollectionState>>,
    query: OrderQuery,
    unavailable: Arc<AtomicBool>,
    primed: bool,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("query", &self.query)
            .field("primed", &self.primed)
            .finish()
    }
}

impl Subscription {
    /// Waits for the next snapshot.
    ///
    /// The first call returns the current state immediately. Returns None
    /// once the store has been dropped.
    pub async fn next(&mut self) -> Option<Result<FeedSnapshot>> {
        if self.primed {
            self.receiver.changed().await.ok()?;
        } else {
            self.primed = true;
        }
        Some(self.current())
    }

    /// Returns a snapshot if one is pending, without waiting.
    pub fn try_next(&mut self) -> Option<Result<FeedSnapshot>> {
        if self.primed {
            match self.receiver.has_changed() {
                Ok(true) => {}
                Ok(false) | Err(_) => return None,
            }
        } else {
            self.primed = true;
        }
        Some(self.current())
    }

    /// Forces the next call to [`Subscription::next`] to yield the current
    /// state immediately, as a freshly opened subscription would.
    pub fn restart(&mut self) {
        self.primed = false;
    }

    /// The query this subscription filters by.
    pub fn query(&self) -> &OrderQuery {
        &self.query
    }

    /// Stops delivery.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Converts the subscription into a stream of snapshots.
    pub fn into_stream(self) -> FeedStream {
        Box::pin(futures_util::stream::unfold(self, |mut sub| async move {
            let item = sub.next().await?;
            Some((item, sub))
        }))
    }

    fn current(&mut self) -> Result<FeedSnapshot> {
        let state = self.receiver.borrow_and_update().clone();
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "order feed interrupted".to_string(),
            ));
        }
        Ok(FeedSnapshot {
            revision: state.revision,
            records: self.query.apply(state.records.iter()),
        })
    }
}
