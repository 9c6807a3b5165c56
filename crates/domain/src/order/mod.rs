//! Order aggregate and related types.

mod aggregate;
mod commands;
mod derivation;
mod events;
mod service;
mod status;
mod value_objects;

pub use aggregate::{NewOrder, Order};
pub use commands::*;
pub use derivation::{derive_from_items, derive_status, effective_item_status};
pub use events::{
    HeldOrderEditedData, ItemStatusChangedData, OrderCancelledData, OrderEvent, OrderHeldData,
    OrderPlacedData, OrderResumedData, PaymentRecordedData, StatusChangedData, StockSettledData,
};
pub use service::OrderService;
pub use status::{OrderItemStatus, OrderStatus};
pub use value_objects::{
    MenuItemId, Money, OrderItem, OrderItemId, OrderNumber, Payment, PaymentDetails,
    PaymentMethod, SelectedModifier, TokenNumber,
};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order is not in a state that allows the action.
    #[error("Invalid state transition: cannot {action} from {current_status} state")]
    InvalidStateTransition {
        current_status: OrderStatus,
        action: &'static str,
    },

    /// Item not found in order.
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: OrderItemId },

    /// Invalid quantity.
    #[error("Invalid quantity for {menu_item_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity {
        menu_item_id: MenuItemId,
        quantity: u32,
    },

    /// The menu item does not exist or is not available.
    #[error("Unknown menu item: {menu_item_id}")]
    UnknownMenuItem { menu_item_id: MenuItemId },

    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Order is already placed.
    #[error("Order already placed")]
    AlreadyPlaced,

    /// Order has not been placed yet.
    #[error("Order not placed")]
    NotPlaced,

    /// Payment was already recorded.
    #[error("Order is already paid")]
    AlreadyPaid,

    /// The order cannot be put on hold.
    #[error("Cannot hold order: {reason}")]
    CannotHold { reason: &'static str },
}
