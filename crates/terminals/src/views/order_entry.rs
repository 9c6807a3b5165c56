use domain::{Order, OrderStatus};
use order_store::OrderQuery;

use super::RoleView;
use crate::config::TerminalRole;

/// Number of paid orders listed as recent at the counter.
pub const RECENT_PAID_LIMIT: usize = 5;

/// Counter screen: the whole collection, newest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderEntryView;

impl OrderEntryView {
    pub fn new() -> Self {
        Self
    }

    /// Held orders, newest first.
    pub fn held<'a>(&self, orders: impl IntoIterator<Item = &'a Order>) -> Vec<&'a Order> {
        orders
            .into_iter()
            .filter(|o| o.status() == OrderStatus::OnHold)
            .collect()
    }

    /// The most recent paid orders that are not on hold.
    pub fn recent_paid<'a>(&self, orders: impl IntoIterator<Item = &'a Order>) -> Vec<&'a Order> {
        orders
            .into_iter()
            .filter(|o| o.is_paid() && o.status() != OrderStatus::OnHold)
            .take(RECENT_PAID_LIMIT)
            .collect()
    }
}

impl RoleView for OrderEntryView {
    fn role(&self) -> TerminalRole {
        TerminalRole::OrderEntry
    }

    fn query(&self) -> OrderQuery {
        OrderQuery::new()
    }
}
