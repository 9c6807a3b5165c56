//! New-order alerting.

use std::collections::HashMap;

use common::OrderId;
use domain::Order;

/// Decides which orders a terminal should flag as new.
///
/// Each order carries a `last_notified` marker that is set when it is
/// placed and bumped when it is resumed from hold. An order alerts when its
/// marker is higher than the last one this terminal alerted on for it.
///
/// The first batch observed after start-up only records markers: a terminal
/// that restarts does not re-announce the whole board.
#[derive(Debug, Default)]
pub struct NewOrderAlerter {
    alerted: HashMap<OrderId, i64>,
    primed: bool,
}

impl NewOrderAlerter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true once the cold-start batch has been observed.
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Records the markers of `orders` and returns the ids to alert on.
    pub fn observe<'a>(&mut self, orders: impl IntoIterator<Item = &'a Order>) -> Vec<OrderId> {
        let mut alerts = Vec::new();

        for order in orders {
            let (Some(order_id), Some(marker)) = (order.id(), order.last_notified()) else {
                continue;
            };

            let previous = self.alerted.get(&order_id).copied();
            if previous.is_some_and(|seen| marker <= seen) {
                continue;
            }

            self.alerted.insert(order_id, marker);
            if self.primed {
                alerts.push(order_id);
            }
        }

        if !self.primed {
            tracing::debug!(orders = self.alerted.len(), "alert markers primed");
            self.primed = true;
        }
        if !alerts.is_empty() {
            metrics::counter!("terminal_alerts_total").increment(alerts.len() as u64);
        }
        alerts
    }

    /// Drops markers of orders no longer on the board.
    pub fn forget(&mut self, order_id: OrderId) {
        self.alerted.remove(&order_id);
    }
}
