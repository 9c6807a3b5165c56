//! What each terminal role shows.
//!
//! A view narrows the store feed twice: `query` is pushed down to the
//! subscription, and `includes` applies the item-level rules the store
//! cannot index.

pub mod bar;
pub mod kitchen;
pub mod order_entry;

pub use bar::BarView;
pub use kitchen::KitchenView;
pub use order_entry::OrderEntryView;

use domain::Order;
use order_store::OrderQuery;

use crate::config::TerminalRole;

/// Filtering rules of one terminal role.
pub trait RoleView: Send + Sync {
    fn role(&self) -> TerminalRole;

    /// Store-side filter and ordering for the subscription.
    fn query(&self) -> OrderQuery;

    /// Returns true if the order belongs on this terminal's board.
    fn includes(&self, _order: &Order) -> bool {
        true
    }
}
