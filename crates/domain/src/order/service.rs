//! Order service providing the API terminals use for order operations.

use std::sync::Arc;

use chrono::FixedOffset;
use common::OrderId;
use order_store::{OrderQuery, OrderStore};

use crate::catalog::MenuCatalog;
use crate::clock::{Clock, SystemClock};
use crate::command::{CommandHandler, CommandResult};
use crate::error::DomainError;
use crate::sequence::SequenceAllocator;

use super::{
    ChangeItemStatus, EditHeldOrder, NewOrder, Order, OrderError, OrderItem, OrderItemId,
    OrderItemStatus, OrderLine, PaymentDetails, PlaceOrder, ResumeOrder, TokenNumber,
};

/// Service for managing orders.
///
/// Wraps the command handler with catalog lookups, the clock, and daily
/// number allocation. Every terminal holds one of these over the shared
/// store.
#[derive(Clone)]
pub struct OrderService<S: OrderStore + Clone> {
    handler: CommandHandler<S>,
    sequences: SequenceAllocator<S>,
    catalog: Arc<dyn MenuCatalog>,
    clock: Arc<dyn Clock>,
}

impl<S: OrderStore + Clone> OrderService<S> {
    /// Creates a new order service over the given store and menu.
    pub fn new(store: S, catalog: Arc<dyn MenuCatalog>) -> Self {
        Self {
            handler: CommandHandler::new(store.clone()),
            sequences: SequenceAllocator::new(store),
            catalog,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the timezone that defines the business day for numbering.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.sequences = self.sequences.with_utc_offset(offset);
        self
    }

    pub fn with_conflict_retries(mut self, retries: u32) -> Self {
        self.handler = self.handler.with_conflict_retries(retries);
        self
    }

    pub fn with_counter_attempts(mut self, attempts: u32) -> Self {
        self.sequences = self.sequences.with_max_attempts(attempts);
        self
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S> {
        &self.handler
    }

    pub fn sequences(&self) -> &SequenceAllocator<S> {
        &self.sequences
    }

    pub fn store(&self) -> &S {
        self.handler.store()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Places a new order.
    ///
    /// Lines are validated against the catalog before any number is
    /// allocated, so a rejected order leaves no gap in the day's sequence.
    /// An order held without payment gets the HELD token and consumes no
    /// token number.
    #[tracing::instrument(skip(self))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<CommandResult, DomainError> {
        let items = self.resolve_lines(&cmd.lines, &[])?;
        if items.is_empty() {
            return Err(OrderError::NoItems.into());
        }

        let now = self.clock.now();
        let order_number = self.sequences.next_order_number(now).await?;
        let token = if cmd.hold && cmd.payment.is_none() {
            TokenNumber::Held
        } else {
            self.sequences.next_token(now).await?
        };

        let new_order = NewOrder {
            order_id: OrderId::new(),
            order_number,
            token,
            items,
            table: cmd.table,
            party_size: cmd.party_size,
            hold: cmd.hold,
            payment: cmd.payment,
        };

        let result = self
            .handler
            .create(move |order| order.place(new_order, now))
            .await?;

        tracing::info!(
            order_id = ?result.order.id(),
            %order_number,
            %token,
            total = %result.order.total_amount(),
            status = %result.order.status(),
            "order placed"
        );
        Ok(result)
    }

    /// Moves one item to a new status, loading the order from the store.
    #[tracing::instrument(skip(self))]
    pub async fn change_item_status(
        &self,
        cmd: ChangeItemStatus,
    ) -> Result<CommandResult, DomainError> {
        let order = self.handler.require(cmd.order_id).await?;
        self.change_item_status_from(order, cmd.item_id, cmd.status)
            .await
    }

    /// Moves one item to a new status, starting from a copy the caller
    /// already holds.
    #[tracing::instrument(skip(self, order), fields(order_id = ?order.id()))]
    pub async fn change_item_status_from(
        &self,
        order: Order,
        item_id: OrderItemId,
        status: OrderItemStatus,
    ) -> Result<CommandResult, DomainError> {
        let result = self
            .handler
            .execute_on(order, |order| order.change_item_status(item_id, status))
            .await?;

        if !result.events.is_empty() {
            tracing::info!(
                %item_id,
                requested = %status,
                order_status = %result.order.status(),
                "item status changed"
            );
        }
        Ok(result)
    }

    /// Marks an item as delivered to the customer.
    #[tracing::instrument(skip(self))]
    pub async fn mark_item_delivered(
        &self,
        order_id: OrderId,
        item_id: OrderItemId,
    ) -> Result<CommandResult, DomainError> {
        self.change_item_status(ChangeItemStatus::new(
            order_id,
            item_id,
            OrderItemStatus::DeliveredToCustomer,
        ))
        .await
    }

    /// Marks an item as delivered, starting from a cached copy.
    pub async fn mark_item_delivered_from(
        &self,
        order: Order,
        item_id: OrderItemId,
    ) -> Result<CommandResult, DomainError> {
        self.change_item_status_from(order, item_id, OrderItemStatus::DeliveredToCustomer)
            .await
    }

    /// Puts a pending order on hold.
    #[tracing::instrument(skip(self))]
    pub async fn hold_order(&self, order_id: OrderId) -> Result<CommandResult, DomainError> {
        let now = self.clock.now();
        let result = self
            .handler
            .execute(order_id, |order| order.hold(now))
            .await?;

        tracing::info!(%order_id, "order held");
        Ok(result)
    }

    /// Replaces the items of a held order.
    ///
    /// Lines pointing at an existing item keep that item's price snapshot;
    /// new lines are priced from the current catalog.
    #[tracing::instrument(skip(self))]
    pub async fn edit_held_order(&self, cmd: EditHeldOrder) -> Result<CommandResult, DomainError> {
        let now = self.clock.now();
        let catalog = Arc::clone(&self.catalog);
        let lines = cmd.lines;
        let table = cmd.table;
        let party_size = cmd.party_size;

        let result = self
            .handler
            .execute(cmd.order_id, |order| {
                let items = resolve_lines(catalog.as_ref(), &lines, order.items())?;
                order.edit_held(items, table.clone(), party_size, now)
            })
            .await?;

        tracing::info!(
            order_id = %cmd.order_id,
            items = result.order.items().len(),
            total = %result.order.total_amount(),
            "held order edited"
        );
        Ok(result)
    }

    /// Releases a held order to the kitchen.
    ///
    /// An order parked without payment carries the HELD token and is issued
    /// a real one here. A paid hold already has its token and keeps it.
    #[tracing::instrument(skip(self))]
    pub async fn resume_order(&self, cmd: ResumeOrder) -> Result<CommandResult, DomainError> {
        let order = self.handler.require(cmd.order_id).await?;
        if !order.status().can_resume() {
            return Err(OrderError::InvalidStateTransition {
                current_status: order.status(),
                action: "resume",
            }
            .into());
        }

        let now = self.clock.now();
        let token = match order.token() {
            Some(token @ TokenNumber::Issued(_)) => token,
            Some(TokenNumber::Held) | None => self.sequences.next_token(now).await?,
        };
        let payment = cmd.payment;

        let result = self
            .handler
            .execute_on(order, |order| order.resume(token, payment, now))
            .await?;

        tracing::info!(
            order_id = %cmd.order_id,
            %token,
            paid = result.order.is_paid(),
            "order resumed"
        );
        Ok(result)
    }

    /// Records payment for an order.
    #[tracing::instrument(skip(self))]
    pub async fn record_payment(
        &self,
        order_id: OrderId,
        payment: PaymentDetails,
    ) -> Result<CommandResult, DomainError> {
        let now = self.clock.now();
        let result = self
            .handler
            .execute(order_id, |order| order.record_payment(payment, now))
            .await?;

        tracing::info!(
            %order_id,
            method = %payment.method,
            change = ?result.order.payment().change_given,
            "payment recorded"
        );
        Ok(result)
    }

    /// Cancels an order.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        reason: Option<String>,
    ) -> Result<CommandResult, DomainError> {
        let now = self.clock.now();
        let result = self
            .handler
            .execute(order_id, |order| order.cancel(reason.clone(), now))
            .await?;

        tracing::info!(%order_id, "order cancelled");
        Ok(result)
    }

    /// Gets an order by ID.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, DomainError> {
        self.handler.load(order_id).await
    }

    /// Lists orders matching a query.
    pub async fn list_orders(&self, query: OrderQuery) -> Result<Vec<Order>, DomainError> {
        let records = self.handler.store().list(query).await?;
        records.iter().map(Order::from_record).collect()
    }

    fn resolve_lines(
        &self,
        lines: &[OrderLine],
        existing: &[OrderItem],
    ) -> Result<Vec<OrderItem>, OrderError> {
        resolve_lines(self.catalog.as_ref(), lines, existing)
    }
}

/// Turns requested lines into order items.
///
/// Existing items keep their id, name, status and unit price; everything
/// else is priced from the catalog.
fn resolve_lines(
    catalog: &dyn MenuCatalog,
    lines: &[OrderLine],
    existing: &[OrderItem],
) -> Result<Vec<OrderItem>, OrderError> {
    lines
        .iter()
        .map(|line| {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity {
                    menu_item_id: line.menu_item_id.clone(),
                    quantity: line.quantity,
                });
            }

            if let Some(item_id) = line.existing_item {
                let item = existing
                    .iter()
                    .find(|i| i.id == item_id)
                    .ok_or(OrderError::ItemNotFound { item_id })?;
                return Ok(OrderItem {
                    quantity: line.quantity,
                    modifiers: line.modifiers.clone(),
                    ..item.clone()
                });
            }

            let menu_item = catalog
                .menu_item(&line.menu_item_id)
                .filter(|m| m.is_available)
                .ok_or_else(|| OrderError::UnknownMenuItem {
                    menu_item_id: line.menu_item_id.clone(),
                })?;

            Ok(
                OrderItem::new(menu_item.id, menu_item.name, line.quantity, menu_item.price)
                    .with_modifiers(line.modifiers.clone()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemoryMenuCatalog, MenuItem};
    use crate::order::{Money, OrderStatus};
    use order_store::InMemoryOrderStore;

    fn catalog() -> InMemoryMenuCatalog {
        InMemoryMenuCatalog::new()
            .with_item(MenuItem::new("latte", "Latte", Money::from_major(150), "drinks"))
            .with_item(MenuItem::new("bagel", "Bagel", Money::from_major(90), "food"))
    }

    fn service() -> OrderService<InMemoryOrderStore> {
        OrderService::new(InMemoryOrderStore::new(), Arc::new(catalog()))
    }

    #[tokio::test]
    async fn test_place_order_prices_from_catalog() {
        let service = service();
        let result = service
            .place_order(PlaceOrder::new(vec![
                OrderLine::new("latte", 2),
                OrderLine::new("bagel", 1),
            ]))
            .await
            .unwrap();

        assert_eq!(result.order.total_amount(), Money::from_major(390));
        assert_eq!(result.order.token(), Some(TokenNumber::Issued(1)));
        assert_eq!(result.order.status(), OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_unknown_menu_item_is_rejected() {
        let service = service();
        let result = service
            .place_order(PlaceOrder::new(vec![OrderLine::new("pizza", 1)]))
            .await;

        assert!(result.unwrap_err().is_validation());
        assert_eq!(service.store().record_count().await, 0);
    }

    #[tokio::test]
    async fn test_unavailable_menu_item_is_rejected() {
        let menu = catalog();
        let mut sold_out = MenuItem::new("scone", "Scone", Money::from_major(60), "food");
        sold_out.is_available = false;
        menu.insert(sold_out);
        let service = OrderService::new(InMemoryOrderStore::new(), Arc::new(menu));

        let result = service
            .place_order(PlaceOrder::new(vec![OrderLine::new("scone", 1)]))
            .await;
        assert!(result.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_edit_keeps_price_snapshot_of_existing_items() {
        let menu = catalog();
        let service = OrderService::new(InMemoryOrderStore::new(), Arc::new(menu.clone()));

        let placed = service
            .place_order(PlaceOrder::new(vec![OrderLine::new("latte", 1)]).on_hold())
            .await
            .unwrap()
            .order;
        let latte = placed.items()[0].id;

        menu.set_price(&"latte".into(), Money::from_major(200));
        menu.set_price(&"bagel".into(), Money::from_major(100));

        let result = service
            .edit_held_order(EditHeldOrder::new(
                placed.id().unwrap(),
                vec![
                    OrderLine::new("latte", 2).replacing(latte),
                    OrderLine::new("bagel", 1),
                ],
            ))
            .await
            .unwrap();

        let edited = result.order;
        assert_eq!(edited.item(latte).unwrap().unit_price, Money::from_major(150));
        assert_eq!(edited.total_amount(), Money::from_major(400));
    }

    #[tokio::test]
    async fn test_resume_requires_held_order() {
        let service = service();
        let placed = service
            .place_order(PlaceOrder::new(vec![OrderLine::new("latte", 1)]))
            .await
            .unwrap()
            .order;

        let result = service
            .resume_order(ResumeOrder::new(placed.id().unwrap()))
            .await;
        assert!(result.unwrap_err().is_validation());

        // No token was burned by the rejected resume.
        let next = service.sequences().next_token(service.clock().now()).await.unwrap();
        assert_eq!(next, TokenNumber::Issued(2));
    }

    #[tokio::test]
    async fn test_resume_issues_token_only_for_unpaid_hold() {
        let service = service();
        let unpaid = service
            .place_order(PlaceOrder::new(vec![OrderLine::new("latte", 1)]).on_hold())
            .await
            .unwrap()
            .order;
        let paid = service
            .place_order(
                PlaceOrder::new(vec![OrderLine::new("bagel", 1)])
                    .on_hold()
                    .paid_with(PaymentDetails::card()),
            )
            .await
            .unwrap()
            .order;
        assert_eq!(unpaid.token(), Some(TokenNumber::Held));
        assert_eq!(paid.token(), Some(TokenNumber::Issued(1)));

        let resumed = service
            .resume_order(ResumeOrder::new(paid.id().unwrap()))
            .await
            .unwrap();
        assert_eq!(resumed.order.token(), Some(TokenNumber::Issued(1)));

        let resumed = service
            .resume_order(ResumeOrder::new(unpaid.id().unwrap()))
            .await
            .unwrap();
        assert_eq!(resumed.order.token(), Some(TokenNumber::Issued(2)));
    }

    #[tokio::test]
    async fn test_list_orders_decodes_documents() {
        let service = service();
        for _ in 0..3 {
            service
                .place_order(PlaceOrder::new(vec![OrderLine::new("bagel", 1)]))
                .await
                .unwrap();
        }

        let orders = service
            .list_orders(OrderQuery::new().status("PENDING"))
            .await
            .unwrap();
        assert_eq!(orders.len(), 3);
        assert!(orders.iter().all(|o| o.total_amount() == Money::from_major(90)));
    }
}
