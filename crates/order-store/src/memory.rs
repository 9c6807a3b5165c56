use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Counter, OrderId, OrderQuery, OrderRecord, Result, StoreError, Subscription, Version,
    feed::{CollectionState, FeedPublisher},
    store::{OrderStore, UpdateOptions},
};

#[derive(Default)]
struct StoreState {
    orders: HashMap<OrderId, OrderRecord>,
    counters: HashMap<String, Counter>,
    revision: u64,
}

impl StoreState {
    fn collection(&self) -> CollectionState {
        CollectionState {
            revision: self.revision,
            records: self.orders.values().cloned().collect(),
        }
    }
}

/// In-memory order store implementation.
///
/// Shared by every terminal in a process; clones share the same state.
/// [`InMemoryOrderStore::set_unavailable`] simulates losing the backend.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<StoreState>>,
    feed: FeedPublisher,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders stored.
    pub async fn record_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Makes every operation fail with `Unavailable` until cleared.
    /// Open subscriptions are woken so they observe the change.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
        self.feed.notify();
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn commit(&self, state: &mut StoreState) {
        state.revision += 1;
        self.feed.publish(state.collection());
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, mut record: OrderRecord) -> Result<OrderId> {
        self.check_available()?;
        let mut state = self.state.write().await;

        if state.orders.contains_key(&record.order_id) {
            return Err(StoreError::AlreadyExists(record.order_id));
        }

        let order_id = record.order_id;
        record.version = Version::first();
        tracing::debug!(%order_id, status = %record.status, "order document created");
        state.orders.insert(order_id, record);
        self.commit(&mut state);

        Ok(order_id)
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<OrderRecord>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.orders.get(&order_id).cloned())
    }

    async fn update(&self, mut record: OrderRecord, options: UpdateOptions) -> Result<Version> {
        self.check_available()?;
        let mut state = self.state.write().await;

        let current = state
            .orders
            .get(&record.order_id)
            .map(|r| r.version)
            .ok_or(StoreError::NotFound(record.order_id))?;

        if let Some(expected) = options.expected_version
            && current != expected
        {
            return Err(StoreError::ConcurrencyConflict {
                document: format!("order/{}", record.order_id),
                expected,
                actual: current,
            });
        }

        let new_version = current.next();
        record.version = new_version;
        record.updated_at = Utc::now();
        tracing::debug!(
            order_id = %record.order_id,
            version = %new_version,
            status = %record.status,
            "order document updated"
        );
        state.orders.insert(record.order_id, record);
        self.commit(&mut state);

        Ok(new_version)
    }

    async fn list(&self, query: OrderQuery) -> Result<Vec<OrderRecord>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(query.apply(state.orders.values()))
    }

    async fn subscribe(&self, query: OrderQuery) -> Result<Subscription> {
        self.check_available()?;
        Ok(self.feed.subscribe(query, self.unavailable.clone()))
    }

    async fn get_counter(&self, key: &str) -> Result<Option<Counter>> {
        self.check_available()?;
        let state = self.state.read().await;
        Ok(state.counters.get(key).cloned())
    }

    async fn put_counter(&self, mut counter: Counter, options: UpdateOptions) -> Result<Version> {
        self.check_available()?;
        let mut state = self.state.write().await;

        let current = state
            .counters
            .get(&counter.key)
            .map(|c| c.version)
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current != expected
        {
            return Err(StoreError::ConcurrencyConflict {
                document: format!("counter/{}", counter.key),
                expected,
                actual: current,
            });
        }

        let new_version = current.next();
        counter.version = new_version;
        state.counters.insert(counter.key.clone(), counter);

        Ok(new_version)
    }
}
