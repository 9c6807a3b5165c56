use domain::{Order, OrderItem, OrderItemStatus, OrderStatus};
use order_store::OrderQuery;

use super::RoleView;
use crate::config::TerminalRole;

/// Serving board: orders with something ready to carry out, oldest first.
///
/// Orders stay on the board while delivery is in progress so the server can
/// see what is already at the table.
#[derive(Debug, Clone, Copy, Default)]
pub struct BarView;

impl BarView {
    pub fn new() -> Self {
        Self
    }

    /// Items waiting to be served.
    pub fn awaiting<'a>(&self, order: &'a Order) -> Vec<&'a OrderItem> {
        order
            .items()
            .iter()
            .filter(|i| i.status == OrderItemStatus::AwaitingDelivery)
            .collect()
    }
}

impl RoleView for BarView {
    fn role(&self) -> TerminalRole {
        TerminalRole::Bar
    }

    fn query(&self) -> OrderQuery {
        OrderQuery::new()
            .excluding_statuses([
                OrderStatus::Completed.as_str(),
                OrderStatus::Cancelled.as_str(),
                OrderStatus::OnHold.as_str(),
            ])
            .oldest_first()
    }

    fn includes(&self, order: &Order) -> bool {
        order.items().iter().any(|i| {
            matches!(
                i.status,
                OrderItemStatus::AwaitingDelivery | OrderItemStatus::DeliveredToCustomer
            )
        })
    }
}
