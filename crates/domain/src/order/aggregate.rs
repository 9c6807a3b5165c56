//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::OrderId;
use order_store::{OrderRecord, Version};
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::error::DomainError;

use super::{
    Money, OrderError, OrderEvent, OrderItem, OrderItemId, OrderItemStatus, OrderNumber,
    OrderStatus, Payment, PaymentDetails, TokenNumber, derive_from_items, derive_status,
    effective_item_status,
    events::{OrderPlacedData, OrderResumedData},
};

/// Everything needed to place an order, already resolved and numbered.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub token: TokenNumber,
    pub items: Vec<OrderItem>,
    pub table: Option<String>,
    pub party_size: Option<u32>,
    /// Place the order as ON_HOLD instead of sending it to the kitchen.
    pub hold: bool,
    pub payment: Option<PaymentDetails>,
}

/// Order aggregate root.
///
/// This is also the stored document: the whole struct is the payload of
/// the order's record, and every write replaces it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Order {
    id: Option<OrderId>,

    /// Version of the record this state was read from.
    #[serde(skip)]
    version: Version,

    order_number: Option<OrderNumber>,
    token: Option<TokenNumber>,
    items: Vec<OrderItem>,
    status: OrderStatus,

    /// Always equal to the sum of the items' line totals.
    total_amount: Money,

    created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    table: Option<String>,

    #[serde(default)]
    party_size: Option<u32>,

    #[serde(default)]
    payment: Payment,

    /// Alert marker (epoch millis). Bumped whenever terminals should treat
    /// the order as new again.
    #[serde(default)]
    last_notified: Option<i64>,

    /// Set in the same write that first makes the order paid and active.
    #[serde(default)]
    settled_at: Option<DateTime<Utc>>,

    #[serde(default)]
    cancellation_reason: Option<String>,
}

impl Aggregate for Order {
    type Event = OrderEvent;
    type Error = OrderError;

    fn id(&self) -> Option<OrderId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            OrderEvent::OrderPlaced(data) => self.apply_order_placed(data),
            OrderEvent::ItemStatusChanged(data) => {
                if let Some(item) = self.items.iter_mut().find(|i| i.id == data.item_id) {
                    item.status = data.to;
                }
            }
            OrderEvent::StatusChanged(data) => {
                self.status = data.to;
            }
            OrderEvent::OrderHeld(_) => {
                self.status = OrderStatus::OnHold;
                self.token = Some(TokenNumber::Held);
            }
            OrderEvent::HeldOrderEdited(data) => {
                self.items = data.items;
                self.table = data.table;
                self.party_size = data.party_size;
                self.recompute_total();
            }
            OrderEvent::OrderResumed(data) => self.apply_order_resumed(data),
            OrderEvent::PaymentRecorded(data) => {
                self.payment = data.payment;
            }
            OrderEvent::StockSettled(data) => {
                self.settled_at = Some(data.settled_at);
            }
            OrderEvent::OrderCancelled(data) => {
                self.status = OrderStatus::Cancelled;
                self.cancellation_reason = data.reason;
            }
        }
    }
}

// Query methods
impl Order {
    /// None until the order has been placed.
    pub fn id(&self) -> Option<OrderId> {
        self.id
    }

    /// Version of the stored document this copy was read from.
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn order_number(&self) -> Option<OrderNumber> {
        self.order_number
    }

    pub fn token(&self) -> Option<TokenNumber> {
        self.token
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns an item by ID.
    pub fn item(&self, item_id: OrderItemId) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn item_statuses(&self) -> Vec<OrderItemStatus> {
        self.items.iter().map(|i| i.status).collect()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn party_size(&self) -> Option<u32> {
        self.party_size
    }

    pub fn payment(&self) -> &Payment {
        &self.payment
    }

    pub fn is_paid(&self) -> bool {
        self.payment.is_paid
    }

    pub fn last_notified(&self) -> Option<i64> {
        self.last_notified
    }

    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        self.settled_at
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    /// Returns true if the order is paid, active, and stock has not been
    /// settled for it yet.
    pub fn is_due_for_settlement(&self) -> bool {
        self.id.is_some()
            && self.payment.is_paid
            && !matches!(self.status, OrderStatus::OnHold | OrderStatus::Cancelled)
            && self.settled_at.is_none()
    }
}

// Command methods (return events)
impl Order {
    /// Places a new order.
    pub fn place(&self, new: NewOrder, now: DateTime<Utc>) -> Result<Vec<OrderEvent>, OrderError> {
        if self.id.is_some() {
            return Err(OrderError::AlreadyPlaced);
        }
        validate_items(&new.items)?;

        let total = total_of(&new.items);
        let payment = new
            .payment
            .map(|details| Payment::settle(details, total))
            .unwrap_or_default();
        let status = if new.hold {
            OrderStatus::OnHold
        } else {
            OrderStatus::Pending
        };

        let events = vec![OrderEvent::OrderPlaced(OrderPlacedData {
            order_id: new.order_id,
            order_number: new.order_number,
            token: new.token,
            items: new.items,
            status,
            table: new.table,
            party_size: new.party_size,
            payment,
            placed_at: now,
        })];
        Ok(self.with_settlement(events, now))
    }

    /// Moves one item to a new status and re-derives the order status.
    ///
    /// Returns no events when the effective item status is unchanged.
    pub fn change_item_status(
        &self,
        item_id: OrderItemId,
        requested: OrderItemStatus,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        self.ensure_placed()?;
        if !self.status.accepts_item_updates() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "change item status",
            });
        }

        let item = self.item(item_id).ok_or(OrderError::ItemNotFound { item_id })?;
        let next = effective_item_status(item.status, requested);
        if next == item.status {
            return Ok(vec![]);
        }

        let mut events = vec![OrderEvent::item_status_changed(item_id, item.status, next)];

        let statuses: Vec<_> = self
            .items
            .iter()
            .map(|i| if i.id == item_id { next } else { i.status })
            .collect();
        let derived = derive_status(self.status, &statuses);
        if derived != self.status {
            events.push(OrderEvent::status_changed(self.status, derived));
        }

        Ok(events)
    }

    /// Puts a pending, unpaid order on hold.
    pub fn hold(&self, now: DateTime<Utc>) -> Result<Vec<OrderEvent>, OrderError> {
        self.ensure_placed()?;
        if !self.status.can_hold() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "hold",
            });
        }
        if self.payment.is_paid {
            return Err(OrderError::CannotHold {
                reason: "order is already paid",
            });
        }
        if self.items.iter().any(|i| i.status != OrderItemStatus::Pending) {
            return Err(OrderError::CannotHold {
                reason: "preparation has started",
            });
        }

        Ok(vec![OrderEvent::order_held(now)])
    }

    /// Replaces the item list of a held order.
    pub fn edit_held(
        &self,
        items: Vec<OrderItem>,
        table: Option<String>,
        party_size: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        self.ensure_placed()?;
        if !self.status.can_edit_items() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "edit items",
            });
        }
        validate_items(&items)?;

        Ok(vec![OrderEvent::held_order_edited(
            items, table, party_size, now,
        )])
    }

    /// Releases a held order, optionally taking payment in the same write.
    pub fn resume(
        &self,
        token: TokenNumber,
        payment: Option<PaymentDetails>,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        self.ensure_placed()?;
        if !self.status.can_resume() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "resume",
            });
        }

        let mut events = vec![OrderEvent::order_resumed(token, now)];
        if let Some(details) = payment
            && !self.payment.is_paid
        {
            events.push(OrderEvent::payment_recorded(
                Payment::settle(details, self.total_amount),
                now,
            ));
        }
        Ok(self.with_settlement(events, now))
    }

    /// Records payment for an unpaid order.
    pub fn record_payment(
        &self,
        details: PaymentDetails,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        self.ensure_placed()?;
        if !self.status.can_record_payment() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "record payment",
            });
        }
        if self.payment.is_paid {
            return Err(OrderError::AlreadyPaid);
        }

        let events = vec![OrderEvent::payment_recorded(
            Payment::settle(details, self.total_amount),
            now,
        )];
        Ok(self.with_settlement(events, now))
    }

    /// Cancels the order.
    pub fn cancel(
        &self,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, OrderError> {
        self.ensure_placed()?;
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "cancel",
            });
        }

        Ok(vec![OrderEvent::order_cancelled(reason, now)])
    }

    fn ensure_placed(&self) -> Result<(), OrderError> {
        if self.id.is_none() {
            return Err(OrderError::NotPlaced);
        }
        Ok(())
    }

    /// Appends `StockSettled` when `events` make the order due for it.
    fn with_settlement(&self, mut events: Vec<OrderEvent>, now: DateTime<Utc>) -> Vec<OrderEvent> {
        let mut next = self.clone();
        next.apply_events(events.iter().cloned());
        if next.is_due_for_settlement() {
            events.push(OrderEvent::stock_settled(now));
        }
        events
    }
}

// Apply event helpers
impl Order {
    fn apply_order_placed(&mut self, data: OrderPlacedData) {
        self.id = Some(data.order_id);
        self.order_number = Some(data.order_number);
        self.token = Some(data.token);
        self.items = data.items;
        self.status = data.status;
        self.table = data.table;
        self.party_size = data.party_size;
        self.payment = data.payment;
        self.created_at = Some(data.placed_at);
        self.last_notified = Some(data.placed_at.timestamp_millis());
        self.recompute_total();
    }

    fn apply_order_resumed(&mut self, data: OrderResumedData) {
        self.token = Some(data.token);
        self.status = derive_from_items(&self.item_statuses()).unwrap_or(OrderStatus::Pending);
        let marker = data.resumed_at.timestamp_millis();
        self.last_notified = Some(match self.last_notified {
            Some(previous) => marker.max(previous + 1),
            None => marker,
        });
    }

    fn recompute_total(&mut self) {
        self.total_amount = total_of(&self.items);
    }
}

// Document mapping
impl Order {
    /// Builds the store record for this order.
    pub fn to_record(&self) -> Result<OrderRecord, DomainError> {
        let (Some(order_id), Some(created_at)) = (self.id, self.created_at) else {
            return Err(OrderError::NotPlaced.into());
        };

        let record = OrderRecord::builder()
            .order_id(order_id)
            .version(self.version)
            .created_at(created_at)
            .status(self.status.as_str())
            .is_paid(self.payment.is_paid)
            .payload(self)?
            .build();
        Ok(record)
    }

    /// Decodes an order from its store record.
    pub fn from_record(record: &OrderRecord) -> Result<Self, DomainError> {
        let mut order: Order = record.decode()?;
        order.version = record.version;
        Ok(order)
    }
}

fn total_of(items: &[OrderItem]) -> Money {
    items.iter().map(OrderItem::line_total).sum()
}

fn validate_items(items: &[OrderItem]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::NoItems);
    }
    if let Some(item) = items.iter().find(|i| i.quantity == 0) {
        return Err(OrderError::InvalidQuantity {
            menu_item_id: item.menu_item_id.clone(),
            quantity: item.quantity,
        });
    }
    Ok(())
}
