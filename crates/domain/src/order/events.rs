//! Order domain events.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{OrderItem, OrderItemId, OrderItemStatus, OrderNumber, OrderStatus, Payment, TokenNumber};

/// Events that can occur on an order aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// Order was placed at the order-entry terminal.
    OrderPlaced(OrderPlacedData),

    /// One item moved to a new status.
    ItemStatusChanged(ItemStatusChangedData),

    /// The aggregate status was re-derived to a new value.
    StatusChanged(StatusChangedData),

    /// A pending order was put on hold.
    OrderHeld(OrderHeldData),

    /// The item list of a held order was replaced.
    HeldOrderEdited(HeldOrderEditedData),

    /// A held order was released to the kitchen.
    OrderResumed(OrderResumedData),

    /// Payment was taken.
    PaymentRecorded(PaymentRecordedData),

    /// The order became paid and active; ingredient stock is due.
    StockSettled(StockSettledData),

    /// Order was cancelled.
    OrderCancelled(OrderCancelledData),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => "OrderPlaced",
            OrderEvent::ItemStatusChanged(_) => "ItemStatusChanged",
            OrderEvent::StatusChanged(_) => "StatusChanged",
            OrderEvent::OrderHeld(_) => "OrderHeld",
            OrderEvent::HeldOrderEdited(_) => "HeldOrderEdited",
            OrderEvent::OrderResumed(_) => "OrderResumed",
            OrderEvent::PaymentRecorded(_) => "PaymentRecorded",
            OrderEvent::StockSettled(_) => "StockSettled",
            OrderEvent::OrderCancelled(_) => "OrderCancelled",
        }
    }
}

/// Data for OrderPlaced event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedData {
    pub order_id: OrderId,
    pub order_number: OrderNumber,
    pub token: TokenNumber,
    pub items: Vec<OrderItem>,
    /// `Pending`, or `OnHold` when placed as a held order.
    pub status: OrderStatus,
    pub table: Option<String>,
    pub party_size: Option<u32>,
    pub payment: Payment,
    pub placed_at: DateTime<Utc>,
}

/// Data for ItemStatusChanged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemStatusChangedData {
    pub item_id: OrderItemId,
    pub from: OrderItemStatus,
    pub to: OrderItemStatus,
}

/// Data for StatusChanged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedData {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Data for OrderHeld event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderHeldData {
    pub held_at: DateTime<Utc>,
}

/// Data for HeldOrderEdited event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeldOrderEditedData {
    pub items: Vec<OrderItem>,
    pub table: Option<String>,
    pub party_size: Option<u32>,
    pub edited_at: DateTime<Utc>,
}

/// Data for OrderResumed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResumedData {
    /// Token the order carries from now on.
    pub token: TokenNumber,
    pub resumed_at: DateTime<Utc>,
}

/// Data for PaymentRecorded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecordedData {
    pub payment: Payment,
    pub paid_at: DateTime<Utc>,
}

/// Data for StockSettled event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSettledData {
    pub settled_at: DateTime<Utc>,
}

/// Data for OrderCancelled event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledData {
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

// Convenience constructors for events
impl OrderEvent {
    pub fn item_status_changed(
        item_id: OrderItemId,
        from: OrderItemStatus,
        to: OrderItemStatus,
    ) -> Self {
        OrderEvent::ItemStatusChanged(ItemStatusChangedData { item_id, from, to })
    }

    pub fn status_changed(from: OrderStatus, to: OrderStatus) -> Self {
        OrderEvent::StatusChanged(StatusChangedData { from, to })
    }

    pub fn order_held(held_at: DateTime<Utc>) -> Self {
        OrderEvent::OrderHeld(OrderHeldData { held_at })
    }

    pub fn held_order_edited(
        items: Vec<OrderItem>,
        table: Option<String>,
        party_size: Option<u32>,
        edited_at: DateTime<Utc>,
    ) -> Self {
        OrderEvent::HeldOrderEdited(HeldOrderEditedData {
            items,
            table,
            party_size,
            edited_at,
        })
    }

    pub fn order_resumed(token: TokenNumber, resumed_at: DateTime<Utc>) -> Self {
        OrderEvent::OrderResumed(OrderResumedData { token, resumed_at })
    }

    pub fn payment_recorded(payment: Payment, paid_at: DateTime<Utc>) -> Self {
        OrderEvent::PaymentRecorded(PaymentRecordedData { payment, paid_at })
    }

    pub fn stock_settled(settled_at: DateTime<Utc>) -> Self {
        OrderEvent::StockSettled(StockSettledData { settled_at })
    }

    pub fn order_cancelled(reason: Option<String>, cancelled_at: DateTime<Utc>) -> Self {
        OrderEvent::OrderCancelled(OrderCancelledData {
            reason,
            cancelled_at,
        })
    }

    /// Returns true for the event that triggers stock deduction.
    pub fn is_stock_settled(&self) -> bool {
        matches!(self, OrderEvent::StockSettled(_))
    }
}
