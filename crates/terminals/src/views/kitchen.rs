use std::sync::Arc;

use domain::{MenuCatalog, Order, OrderItem, OrderItemStatus, OrderStatus};
use order_store::OrderQuery;

use super::RoleView;
use crate::config::TerminalRole;

/// Board of a kitchen station, oldest order first.
///
/// A station can be limited to some menu categories; it then sees only
/// orders with a live item from one of them.
#[derive(Clone)]
pub struct KitchenView {
    catalog: Arc<dyn MenuCatalog>,
    categories: Vec<String>,
}

impl KitchenView {
    /// A station that prepares every category.
    pub fn new(catalog: Arc<dyn MenuCatalog>) -> Self {
        Self {
            catalog,
            categories: Vec::new(),
        }
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// Items of `order` this station works on.
    pub fn items<'a>(&self, order: &'a Order) -> Vec<&'a OrderItem> {
        order
            .items()
            .iter()
            .filter(|item| is_kitchen_status(item.status) && self.prepares(item))
            .collect()
    }

    fn prepares(&self, item: &OrderItem) -> bool {
        if self.categories.is_empty() {
            return true;
        }
        self.catalog
            .menu_item(&item.menu_item_id)
            .is_some_and(|m| self.categories.contains(&m.category_id))
    }
}

fn is_kitchen_status(status: OrderItemStatus) -> bool {
    matches!(
        status,
        OrderItemStatus::Pending
            | OrderItemStatus::Preparing
            | OrderItemStatus::Ready
            | OrderItemStatus::AwaitingDelivery
    )
}

impl RoleView for KitchenView {
    fn role(&self) -> TerminalRole {
        TerminalRole::Kitchen
    }

    fn query(&self) -> OrderQuery {
        OrderQuery::new()
            .excluding_statuses([
                OrderStatus::Completed.as_str(),
                OrderStatus::Cancelled.as_str(),
                OrderStatus::DeliveryInProgress.as_str(),
                OrderStatus::OnHold.as_str(),
            ])
            .oldest_first()
    }

    fn includes(&self, order: &Order) -> bool {
        !self.items(order).is_empty()
    }
}
