//! Domain layer for the order lifecycle.
//!
//! This crate provides:
//! - Aggregate trait and the Order aggregate with its events
//! - Status derivation from item statuses, layered under an explicit
//!   lifecycle state machine
//! - CommandHandler with compare-and-swap writes and conflict retries
//! - Daily order number and token allocation over shared counters
//! - OrderService, the entry point used by terminals

pub mod aggregate;
pub mod catalog;
pub mod clock;
pub mod command;
pub mod error;
pub mod order;
pub mod sequence;

pub use aggregate::{Aggregate, DomainEvent};
pub use catalog::{InMemoryMenuCatalog, MenuCatalog, MenuItem};
pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{CommandHandler, CommandResult, DEFAULT_CONFLICT_RETRIES};
pub use error::DomainError;
pub use order::{
    ChangeItemStatus, EditHeldOrder, MenuItemId, Money, NewOrder, Order, OrderError, OrderEvent,
    OrderItem, OrderItemId, OrderItemStatus, OrderLine, OrderNumber, OrderService, OrderStatus,
    Payment, PaymentDetails, PaymentMethod, PlaceOrder, ResumeOrder, SelectedModifier,
    TokenNumber, derive_from_items, derive_status, effective_item_status,
};
pub use sequence::{DEFAULT_COUNTER_ATTEMPTS, SequenceAllocator};
