//! Local copy of the orders a terminal subscribes to.

use std::collections::HashMap;

use common::OrderId;
use domain::{DomainError, Order};
use order_store::FeedSnapshot;

/// One difference between the cache and an incoming snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedChange {
    Added(OrderId),
    Changed(OrderId),
    Removed(OrderId),
}

impl FeedChange {
    pub fn order_id(&self) -> OrderId {
        match self {
            FeedChange::Added(id) | FeedChange::Changed(id) | FeedChange::Removed(id) => *id,
        }
    }
}

/// The orders currently matching a terminal's subscription, in feed order.
///
/// Every order keeps the highest version seen. A snapshot carrying an older
/// copy than the cache already holds (for instance right after this
/// terminal applied its own write) leaves the cached copy in place.
#[derive(Debug, Default)]
pub struct OrderCache {
    orders: HashMap<OrderId, Order>,
    ordering: Vec<OrderId>,
    revision: u64,
}

impl OrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store revision of the last snapshot applied.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.ordering.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordering.is_empty()
    }

    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// Cached orders in the order the feed delivered them.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.ordering.iter().filter_map(|id| self.orders.get(id))
    }

    /// Brings the cache in line with a snapshot and reports what changed.
    ///
    /// Snapshots older than the last one applied are ignored. Every record
    /// is decoded before anything is touched, so a bad record leaves the
    /// cache as it was.
    pub fn reconcile(&mut self, snapshot: &FeedSnapshot) -> Result<Vec<FeedChange>, DomainError> {
        if snapshot.revision < self.revision {
            tracing::debug!(
                snapshot = snapshot.revision,
                cached = self.revision,
                "ignoring stale snapshot"
            );
            return Ok(Vec::new());
        }

        let incoming = snapshot
            .records
            .iter()
            .map(Order::from_record)
            .collect::<Result<Vec<_>, _>>()?;

        let mut changes = Vec::new();
        let mut next = HashMap::with_capacity(incoming.len());
        let mut ordering = Vec::with_capacity(incoming.len());

        for order in incoming {
            let Some(order_id) = order.id() else {
                continue;
            };
            ordering.push(order_id);

            let kept = match self.orders.remove(&order_id) {
                None => {
                    changes.push(FeedChange::Added(order_id));
                    order
                }
                Some(cached) if order.version() > cached.version() => {
                    changes.push(FeedChange::Changed(order_id));
                    order
                }
                Some(cached) => cached,
            };
            next.insert(order_id, kept);
        }

        changes.extend(self.orders.keys().copied().map(FeedChange::Removed));

        self.orders = next;
        self.ordering = ordering;
        self.revision = snapshot.revision;
        Ok(changes)
    }

    /// Stores the result of this terminal's own write ahead of the feed.
    ///
    /// Ignored when the cache already holds the same or a newer version, or
    /// when the order is not part of this terminal's subscription yet.
    pub fn remember(&mut self, order: Order) {
        let Some(order_id) = order.id() else {
            return;
        };
        if let Some(cached) = self.orders.get_mut(&order_id)
            && order.version() > cached.version()
        {
            *cached = order;
        }
    }
}
