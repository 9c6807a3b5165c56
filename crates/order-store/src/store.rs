use async_trait::async_trait;

use crate::{Counter, OrderId, OrderQuery, OrderRecord, Result, StoreError, Subscription, Version};

/// Options for writing a document to the store.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    /// Expected version of the document for optimistic concurrency control.
    /// If None, no version check is performed and the write replaces
    /// whatever is stored (last writer wins, use with caution).
    pub expected_version: Option<Version>,
}

impl UpdateOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the document to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting the document to not exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// Core trait for order store implementations.
///
/// The store keeps one document per order and a handful of counter
/// documents. Writes are atomic per document. All implementations must be
/// thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Creates a new order document.
    ///
    /// Fails with `AlreadyExists` if the id is taken. The stored document
    /// starts at [`Version::first`].
    async fn create(&self, record: OrderRecord) -> Result<OrderId>;

    /// Retrieves a single order document.
    ///
    /// Returns None if the order doesn't exist.
    async fn get(&self, order_id: OrderId) -> Result<Option<OrderRecord>>;

    /// Replaces an existing order document.
    ///
    /// If `options.expected_version` is set, the write fails with
    /// `ConcurrencyConflict` when the stored version differs. The version
    /// on `record` is ignored; the store assigns the next one and returns it.
    async fn update(&self, record: OrderRecord, options: UpdateOptions) -> Result<Version>;

    /// Retrieves orders matching a query.
    async fn list(&self, query: OrderQuery) -> Result<Vec<OrderRecord>>;

    /// Opens a live subscription over the orders matching a query.
    ///
    /// The first snapshot is available immediately; later ones arrive after
    /// every committed write.
    async fn subscribe(&self, query: OrderQuery) -> Result<Subscription>;

    /// Reads a counter document.
    ///
    /// Returns None if the counter has never been written.
    async fn get_counter(&self, key: &str) -> Result<Option<Counter>>;

    /// Writes a counter document, returning its new version.
    ///
    /// Same version semantics as [`OrderStore::update`], except that a
    /// missing counter is at [`Version::initial`] rather than an error.
    async fn put_counter(&self, counter: Counter, options: UpdateOptions) -> Result<Version>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Loads an order, failing with `NotFound` when it doesn't exist.
    async fn require(&self, order_id: OrderId) -> Result<OrderRecord> {
        self.get(order_id)
            .await?
            .ok_or(StoreError::NotFound(order_id))
    }

    /// Checks if an order exists.
    async fn exists(&self, order_id: OrderId) -> Result<bool> {
        Ok(self.get(order_id).await?.is_some())
    }

    /// Atomically increments a counter and returns the new value.
    ///
    /// Each attempt reads the counter and writes `value + 1` expecting the
    /// version it read. Lost races retry up to `max_attempts` times; any
    /// other error is returned immediately.
    async fn increment_counter(&self, key: &str, max_attempts: u32) -> Result<u64> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let current = self.get_counter(key).await?;
            let (value, version) = current
                .map(|c| (c.value, c.version))
                .unwrap_or((0, Version::initial()));

            let next = Counter::new(key, value + 1);
            match self
                .put_counter(next, UpdateOptions::expect_version(version))
                .await
            {
                Ok(_) => return Ok(value + 1),
                Err(e) if e.is_conflict() && attempt < max_attempts => {
                    tracing::debug!(key, attempt, "counter increment lost a race, retrying");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}
