//! Command handling infrastructure.

use common::OrderId;
use order_store::{OrderStore, UpdateOptions, Version};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;
use crate::order::{Order, OrderError, OrderEvent};

/// Default number of times a command is re-run after losing a write race.
pub const DEFAULT_CONFLICT_RETRIES: u32 = 3;

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// The order after applying the new events.
    pub order: Order,

    /// The events that were generated and persisted.
    pub events: Vec<OrderEvent>,

    /// The version of the order document after the command.
    pub new_version: Version,
}

impl CommandResult {
    /// Returns true if this write is the one that settled the order's stock.
    pub fn settled(&self) -> bool {
        self.events.iter().any(OrderEvent::is_stock_settled)
    }
}

/// Handler for executing commands against orders.
///
/// The handler is responsible for:
/// 1. Loading the order document from the store
/// 2. Executing the command to produce events
/// 3. Writing the folded state back with a compare-and-swap on its version
/// 4. Re-running the command on fresh state when another terminal won the race
#[derive(Debug, Clone)]
pub struct CommandHandler<S: OrderStore> {
    store: S,
    max_conflict_retries: u32,
}

impl<S: OrderStore> CommandHandler<S> {
    /// Creates a new command handler with the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_conflict_retries: DEFAULT_CONFLICT_RETRIES,
        }
    }

    /// Sets how many times a conflicting write is retried.
    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an order, returning None if it doesn't exist.
    pub async fn load(&self, order_id: OrderId) -> Result<Option<Order>, DomainError> {
        match self.store.get(order_id).await? {
            Some(record) => Ok(Some(Order::from_record(&record)?)),
            None => Ok(None),
        }
    }

    /// Loads an order, failing when it doesn't exist.
    pub async fn require(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.load(order_id)
            .await?
            .ok_or_else(|| DomainError::order_not_found(order_id))
    }

    /// Runs a placement command against a fresh order and creates its document.
    pub async fn create<F>(&self, command: F) -> Result<CommandResult, DomainError>
    where
        F: FnOnce(&Order) -> Result<Vec<OrderEvent>, OrderError>,
    {
        let mut order = Order::default();
        let events = command(&order)?;
        order.apply_events(events.iter().cloned());

        let record = order.to_record()?;
        self.store.create(record).await?;
        order.set_version(Version::first());

        metrics::counter!("orders_placed_total").increment(1);

        Ok(CommandResult {
            order,
            events,
            new_version: Version::first(),
        })
    }

    /// Loads an order, executes a command and writes the result.
    pub async fn execute<F>(
        &self,
        order_id: OrderId,
        command: F,
    ) -> Result<CommandResult, DomainError>
    where
        F: Fn(&Order) -> Result<Vec<OrderEvent>, OrderError> + Send + Sync,
    {
        let order = self.require(order_id).await?;
        self.execute_on(order, command).await
    }

    /// Executes a command against an order the caller already holds, such
    /// as a terminal's cached copy.
    ///
    /// The first attempt uses `order` as-is; if its version turns out to be
    /// stale, the order is reloaded and the command re-run, so a decision
    /// is never written over state it did not see.
    pub async fn execute_on<F>(
        &self,
        mut order: Order,
        command: F,
    ) -> Result<CommandResult, DomainError>
    where
        F: Fn(&Order) -> Result<Vec<OrderEvent>, OrderError> + Send + Sync,
    {
        let order_id = order.id().ok_or(OrderError::NotPlaced)?;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let events = command(&order)?;
            if events.is_empty() {
                let new_version = order.version();
                return Ok(CommandResult {
                    order,
                    events,
                    new_version,
                });
            }

            tracing::debug!(
                %order_id,
                events = ?events.iter().map(DomainEvent::event_type).collect::<Vec<_>>(),
                "command accepted"
            );

            let current_version = order.version();
            let mut next = order.clone();
            next.apply_events(events.iter().cloned());
            let record = next.to_record()?;

            match self
                .store
                .update(record, UpdateOptions::expect_version(current_version))
                .await
            {
                Ok(new_version) => {
                    next.set_version(new_version);
                    metrics::counter!("order_commands_total").increment(1);
                    return Ok(CommandResult {
                        order: next,
                        events,
                        new_version,
                    });
                }
                Err(e) if e.is_conflict() && attempt <= self.max_conflict_retries => {
                    tracing::warn!(%order_id, attempt, "order write conflict, reloading");
                    metrics::counter!("order_write_conflicts_total").increment(1);
                    order = self.require(order_id).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{
        Money, NewOrder, OrderItem, OrderItemStatus, OrderNumber, OrderStatus, TokenNumber,
    };
    use chrono::{NaiveDate, Utc};
    use order_store::InMemoryOrderStore;

    fn placement(order: &Order) -> Result<Vec<OrderEvent>, OrderError> {
        order.place(
            NewOrder {
                order_id: OrderId::new(),
                order_number: OrderNumber::new(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), 1),
                token: TokenNumber::Issued(1),
                items: vec![
                    OrderItem::new("latte", "Latte", 1, Money::from_major(150)),
                    OrderItem::new("bagel", "Bagel", 1, Money::from_major(90)),
                ],
                table: None,
                party_size: None,
                hold: false,
                payment: None,
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_create_writes_document() {
        let store = InMemoryOrderStore::new();
        let handler = CommandHandler::new(store.clone());

        let result = handler.create(placement).await.unwrap();

        assert_eq!(result.new_version, Version::first());
        assert_eq!(result.events.len(), 1);
        assert!(!result.settled());

        let order_id = result.order.id().unwrap();
        let loaded = handler.require(order_id).await.unwrap();
        assert_eq!(loaded.version(), Version::first());
        assert_eq!(loaded.total_amount(), Money::from_major(240));
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_execute_updates_document() {
        let handler = CommandHandler::new(InMemoryOrderStore::new());
        let placed = handler.create(placement).await.unwrap().order;
        let item_id = placed.items()[0].id;

        let result = handler
            .execute(placed.id().unwrap(), |order| {
                order.change_item_status(item_id, OrderItemStatus::Preparing)
            })
            .await
            .unwrap();

        assert_eq!(result.new_version, Version::new(2));
        assert_eq!(result.order.status(), OrderStatus::Preparing);
    }

    #[tokio::test]
    async fn test_empty_events_returns_without_writing() {
        let store = InMemoryOrderStore::new();
        let handler = CommandHandler::new(store.clone());
        let placed = handler.create(placement).await.unwrap().order;

        let result = handler.execute_on(placed, |_| Ok(vec![])).await.unwrap();

        assert!(result.events.is_empty());
        assert_eq!(result.new_version, Version::first());
    }

    #[tokio::test]
    async fn test_stale_copy_is_reloaded_and_rerun() {
        let handler = CommandHandler::new(InMemoryOrderStore::new());
        let stale = handler.create(placement).await.unwrap().order;
        let first = stale.items()[0].id;
        let second = stale.items()[1].id;

        handler
            .execute(stale.id().unwrap(), |order| {
                order.change_item_status(first, OrderItemStatus::Ready)
            })
            .await
            .unwrap();

        let result = handler
            .execute_on(stale, |order| {
                order.change_item_status(second, OrderItemStatus::Ready)
            })
            .await
            .unwrap();

        assert_eq!(result.new_version, Version::new(3));
        assert_eq!(
            result.order.item(first).unwrap().status,
            OrderItemStatus::AwaitingDelivery
        );
        assert_eq!(result.order.status(), OrderStatus::ReadyForDelivery);
    }

    #[tokio::test]
    async fn test_conflicts_give_up_after_retry_limit() {
        let handler =
            CommandHandler::new(InMemoryOrderStore::new()).with_conflict_retries(0);
        let stale = handler.create(placement).await.unwrap().order;
        let item_id = stale.items()[0].id;

        handler
            .execute(stale.id().unwrap(), |order| {
                order.change_item_status(item_id, OrderItemStatus::Preparing)
            })
            .await
            .unwrap();

        let result = handler
            .execute_on(stale, |order| order.cancel(None, Utc::now()))
            .await;

        assert!(result.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_rejected_command_writes_nothing() {
        let handler = CommandHandler::new(InMemoryOrderStore::new());
        let placed = handler.create(placement).await.unwrap().order;
        let order_id = placed.id().unwrap();

        let result = handler
            .execute(order_id, |order| {
                order.change_item_status(crate::order::OrderItemId::new(), OrderItemStatus::Ready)
            })
            .await;

        assert!(result.unwrap_err().is_validation());
        let loaded = handler.require(order_id).await.unwrap();
        assert_eq!(loaded.version(), Version::first());
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let handler = CommandHandler::new(InMemoryOrderStore::new());
        let result = handler
            .execute(OrderId::new(), |order| order.cancel(None, Utc::now()))
            .await;
        assert!(result.unwrap_err().is_not_found());
    }
}
