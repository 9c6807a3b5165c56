//! Order commands.
//!
//! These are the requests terminals send to [`OrderService`](super::OrderService).
//! Lines name menu items; prices are resolved from the catalog by the
//! service, never taken from the caller.

use common::OrderId;

use super::{MenuItemId, OrderItemId, OrderItemStatus, PaymentDetails, SelectedModifier};

/// One requested line of an order.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    pub modifiers: Vec<SelectedModifier>,

    /// When editing a held order, the item this line replaces. The existing
    /// item keeps its id and price snapshot.
    pub existing_item: Option<OrderItemId>,
}

impl OrderLine {
    /// Creates a new line without modifiers.
    pub fn new(menu_item_id: impl Into<MenuItemId>, quantity: u32) -> Self {
        Self {
            menu_item_id: menu_item_id.into(),
            quantity,
            modifiers: Vec::new(),
            existing_item: None,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Vec<SelectedModifier>) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Marks this line as an edit of an item already on the order.
    pub fn replacing(mut self, item_id: OrderItemId) -> Self {
        self.existing_item = Some(item_id);
        self
    }
}

/// Command to place a new order.
#[derive(Debug, Clone, Default)]
pub struct PlaceOrder {
    pub lines: Vec<OrderLine>,
    pub table: Option<String>,
    pub party_size: Option<u32>,

    /// Park the order as ON_HOLD instead of sending it to the kitchen.
    pub hold: bool,

    /// Payment taken at the counter, if any.
    pub payment: Option<PaymentDetails>,
}

impl PlaceOrder {
    pub fn new(lines: Vec<OrderLine>) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }

    pub fn at_table(mut self, table: impl Into<String>, party_size: u32) -> Self {
        self.table = Some(table.into());
        self.party_size = Some(party_size);
        self
    }

    pub fn on_hold(mut self) -> Self {
        self.hold = true;
        self
    }

    pub fn paid_with(mut self, payment: PaymentDetails) -> Self {
        self.payment = Some(payment);
        self
    }
}

/// Command to move one item to a new status.
#[derive(Debug, Clone, Copy)]
pub struct ChangeItemStatus {
    pub order_id: OrderId,
    pub item_id: OrderItemId,
    pub status: OrderItemStatus,
}

impl ChangeItemStatus {
    pub fn new(order_id: OrderId, item_id: OrderItemId, status: OrderItemStatus) -> Self {
        Self {
            order_id,
            item_id,
            status,
        }
    }
}

/// Command to replace the items of a held order.
#[derive(Debug, Clone)]
pub struct EditHeldOrder {
    pub order_id: OrderId,
    pub lines: Vec<OrderLine>,
    pub table: Option<String>,
    pub party_size: Option<u32>,
}

impl EditHeldOrder {
    pub fn new(order_id: OrderId, lines: Vec<OrderLine>) -> Self {
        Self {
            order_id,
            lines,
            table: None,
            party_size: None,
        }
    }

    pub fn at_table(mut self, table: impl Into<String>, party_size: u32) -> Self {
        self.table = Some(table.into());
        self.party_size = Some(party_size);
        self
    }
}

/// Command to release a held order, optionally paying for it.
#[derive(Debug, Clone, Copy)]
pub struct ResumeOrder {
    pub order_id: OrderId,
    pub payment: Option<PaymentDetails>,
}

impl ResumeOrder {
    pub fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            payment: None,
        }
    }

    pub fn paid_with(mut self, payment: PaymentDetails) -> Self {
        self.payment = Some(payment);
        self
    }
}
