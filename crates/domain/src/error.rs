//! Domain error types.

use order_store::StoreError;
use thiserror::Error;

use crate::order::OrderError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the order store.
    #[error("Order store error: {0}")]
    Store(#[from] StoreError),

    /// The order aggregate rejected a command.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A daily counter went past the largest number it can hand out.
    #[error("sequence {key} exhausted at {value}")]
    SequenceExhausted { key: String, value: u64 },
}

impl DomainError {
    pub(crate) fn order_not_found(id: impl ToString) -> Self {
        DomainError::NotFound {
            entity: "Order",
            id: id.to_string(),
        }
    }

    /// Returns true when a referenced order or document is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::NotFound { .. } | DomainError::Store(StoreError::NotFound(_))
        )
    }

    /// Returns true when the command was rejected on its inputs or on the
    /// order's current state.
    pub fn is_validation(&self) -> bool {
        matches!(self, DomainError::Order(_))
    }

    /// Returns true when the store could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DomainError::Store(e) if e.is_unavailable())
    }

    /// Returns true when a compare-and-swap write kept losing races.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::Store(e) if e.is_conflict())
    }
}
