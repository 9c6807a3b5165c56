//! Aggregate status derivation.
//!
//! Two layers: [`derive_from_items`] is a pure function over item statuses,
//! and [`derive_status`] wraps it with the lifecycle rules (sticky statuses
//! and keeping the previous value when no rule matches).

use super::{OrderItemStatus, OrderStatus};

/// Derives the aggregate status from item statuses alone.
///
/// Cancelled items are ignored, except that PENDING needs every item in
/// the list to be pending. Returns None when the item list is empty or
/// no rule matches; the caller decides what that means.
pub fn derive_from_items(items: &[OrderItemStatus]) -> Option<OrderStatus> {
    use OrderItemStatus as Item;

    if items.is_empty() {
        return None;
    }

    let active: Vec<Item> = items.iter().copied().filter(Item::is_active).collect();
    if active.is_empty() {
        return Some(OrderStatus::Cancelled);
    }

    let all = |pred: fn(&Item) -> bool| active.iter().all(pred);
    let any = |pred: fn(&Item) -> bool| active.iter().any(pred);
    let delivered = |s: &Item| *s == Item::DeliveredToCustomer;

    if all(delivered) {
        return Some(OrderStatus::Completed);
    }
    if any(delivered) && all(|s| s.is_ready() || *s == Item::DeliveredToCustomer) {
        return Some(OrderStatus::DeliveryInProgress);
    }
    if all(Item::is_ready) {
        return Some(OrderStatus::ReadyForDelivery);
    }
    if any(|s| *s == Item::Preparing) {
        return Some(OrderStatus::Preparing);
    }
    if any(Item::is_ready) && any(Item::is_in_kitchen) {
        return Some(OrderStatus::PartiallyReady);
    }
    // Unlike the rules above, a cancelled item blocks a return to PENDING.
    if items.iter().all(|s| *s == Item::Pending) {
        return Some(OrderStatus::Pending);
    }
    None
}

/// Computes the next aggregate status of an order.
///
/// Sticky statuses are returned unchanged; otherwise the item-derived status
/// wins, falling back to `current` when nothing matched.
pub fn derive_status(current: OrderStatus, items: &[OrderItemStatus]) -> OrderStatus {
    if current.is_sticky() {
        return current;
    }
    derive_from_items(items).unwrap_or(current)
}

/// Maps a requested item status to the status actually stored.
///
/// A kitchen READY means "waiting for the server", so it is stored as
/// AWAITING_DELIVERY. If the server already delivered the item, a late
/// READY does not move it back.
pub fn effective_item_status(
    current: OrderItemStatus,
    requested: OrderItemStatus,
) -> OrderItemStatus {
    match requested {
        OrderItemStatus::Ready if current == OrderItemStatus::DeliveredToCustomer => current,
        OrderItemStatus::Ready => OrderItemStatus::AwaitingDelivery,
        other => other,
    }
}
