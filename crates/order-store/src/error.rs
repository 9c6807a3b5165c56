use thiserror::Error;

use crate::{OrderId, Version};

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A compare-and-swap write found a different version than expected.
    #[error(
        "Concurrency conflict on {document}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        document: String,
        expected: Version,
        actual: Version,
    },

    /// The order does not exist.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// An order with this id already exists.
    #[error("Order already exists: {0}")]
    AlreadyExists(OrderId),

    /// The backing store could not be reached.
    #[error("Order store unavailable: {0}")]
    Unavailable(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true for optimistic-concurrency conflicts.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. })
    }

    /// Returns true when the store itself failed (I/O class errors).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
