//! Terminal error types.

use common::OrderId;
use domain::DomainError;
use order_store::StoreError;
use stock::StockError;
use thiserror::Error;

/// Errors that can occur at a terminal.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// Domain error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Order store error.
    #[error("Order store error: {0}")]
    Store(#[from] StoreError),

    /// Stock error.
    #[error("Stock error: {0}")]
    Stock(#[from] StockError),

    /// The order is not on this terminal's board.
    #[error("Order not on this terminal: {0}")]
    OrderNotCached(OrderId),

    /// The store closed the order feed.
    #[error("Order feed closed")]
    FeedClosed,
}

impl TerminalError {
    /// Returns true when a referenced order, item or ingredient is missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            TerminalError::Domain(e) => e.is_not_found(),
            TerminalError::Store(e) => matches!(e, StoreError::NotFound(_)),
            TerminalError::Stock(e) => e.is_not_found(),
            TerminalError::OrderNotCached(_) => true,
            TerminalError::FeedClosed => false,
        }
    }

    /// Returns true when the request itself was rejected.
    pub fn is_validation(&self) -> bool {
        matches!(self, TerminalError::Domain(e) if e.is_validation())
    }

    /// Returns true when the store or ingredient store could not be reached.
    pub fn is_unavailable(&self) -> bool {
        match self {
            TerminalError::Domain(e) => e.is_unavailable(),
            TerminalError::Store(e) => e.is_unavailable(),
            TerminalError::Stock(e) => e.is_unavailable(),
            TerminalError::FeedClosed => true,
            TerminalError::OrderNotCached(_) => false,
        }
    }

    /// Returns true when a write kept losing races with other terminals.
    pub fn is_conflict(&self) -> bool {
        match self {
            TerminalError::Domain(e) => e.is_conflict(),
            TerminalError::Store(e) => e.is_conflict(),
            _ => false,
        }
    }
}

/// Convenience type alias for terminal results.
pub type Result<T> = std::result::Result<T, TerminalError>;
