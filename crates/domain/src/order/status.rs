//! Order and item status enums with the order lifecycle rules.

use serde::{Deserialize, Serialize};

/// Aggregate status of an order.
///
/// Most values are derived from item statuses. `OnHold`, `Completed` and
/// `Cancelled` are sticky: derivation never moves an order out of them,
/// only an explicit command (resume, cancel) does.
///
/// ```text
///            ┌──────────────── derived from items ───────────────┐
/// Pending ─► Preparing ─► PartiallyReady ─► ReadyForDelivery ─► DeliveryInProgress ─► Completed
///    │  ▲
///    ▼  │ resume
///  OnHold
///
/// any non-terminal ──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    PartiallyReady,
    ReadyForDelivery,
    DeliveryInProgress,
    Completed,
    Cancelled,
    OnHold,
}

impl OrderStatus {
    /// Returns true if derivation must leave this status untouched.
    pub fn is_sticky(&self) -> bool {
        matches!(
            self,
            OrderStatus::OnHold | OrderStatus::Completed | OrderStatus::Cancelled
        )
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Returns true if item statuses may change in this state.
    pub fn accepts_item_updates(&self) -> bool {
        !self.is_sticky()
    }

    /// Returns true if an order in this state may be put on hold.
    ///
    /// The aggregate additionally requires the order to be unpaid with no
    /// item started.
    pub fn can_hold(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be resumed from hold.
    pub fn can_resume(&self) -> bool {
        matches!(self, OrderStatus::OnHold)
    }

    /// Returns true if the item list may be edited in this state.
    pub fn can_edit_items(&self) -> bool {
        matches!(self, OrderStatus::OnHold)
    }

    /// Returns true if the order can be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if a payment may be recorded in this state.
    pub fn can_record_payment(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns the status name as stored in the order document.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::PartiallyReady => "PARTIALLY_READY",
            OrderStatus::ReadyForDelivery => "READY_FOR_DELIVERY",
            OrderStatus::DeliveryInProgress => "DELIVERY_IN_PROGRESS",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::OnHold => "ON_HOLD",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Preparation / serving status of a single line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderItemStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    AwaitingDelivery,
    DeliveredToCustomer,
    Cancelled,
}

impl OrderItemStatus {
    /// Returns true unless the item was cancelled.
    pub fn is_active(&self) -> bool {
        !matches!(self, OrderItemStatus::Cancelled)
    }

    /// Returns true for items finished in the kitchen but not yet served.
    pub fn is_ready(&self) -> bool {
        matches!(
            self,
            OrderItemStatus::Ready | OrderItemStatus::AwaitingDelivery
        )
    }

    /// Returns true for items the kitchen has not finished.
    pub fn is_in_kitchen(&self) -> bool {
        matches!(self, OrderItemStatus::Pending | OrderItemStatus::Preparing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderItemStatus::Pending => "PENDING",
            OrderItemStatus::Preparing => "PREPARING",
            OrderItemStatus::Ready => "READY",
            OrderItemStatus::AwaitingDelivery => "AWAITING_DELIVERY",
            OrderItemStatus::DeliveredToCustomer => "DELIVERED_TO_CUSTOMER",
            OrderItemStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
