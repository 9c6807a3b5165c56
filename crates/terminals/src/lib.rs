//! Terminals kept in sync over the shared order store.
//!
//! This crate provides:
//! - [`Terminal`], the sync core: a store subscription, a local
//!   [`OrderCache`] and new-order alerting with cold-start suppression
//! - [`RoleView`] implementations for the order-entry, kitchen and bar
//!   screens
//! - Typed adapters issuing each role's commands
//! - Environment configuration and tracing setup

pub mod adapters;
pub mod alerts;
pub mod cache;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod terminal;
pub mod views;

pub use adapters::{BarTerminal, EntryOutcome, KitchenTerminal, OrderEntryTerminal, StockOutcome};
pub use alerts::NewOrderAlerter;
pub use cache::{FeedChange, OrderCache};
pub use config::{LogFormat, TerminalConfig, TerminalRole};
pub use error::{Result, TerminalError};
pub use telemetry::init_tracing;
pub use terminal::{SyncOutcome, Terminal};
pub use views::{BarView, KitchenView, OrderEntryView, RoleView};
