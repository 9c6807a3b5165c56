//! Stock error types.

use common::OrderId;
use thiserror::Error;

/// Errors that can occur during stock operations.
#[derive(Debug, Error)]
pub enum StockError {
    /// Ingredient not found.
    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    /// A deduction quantity was negative or not a number.
    #[error("Invalid deduction quantity for {ingredient_id}: {quantity}")]
    InvalidQuantity { ingredient_id: String, quantity: f64 },

    /// The ingredient store could not be reached.
    #[error("Ingredient store unavailable: {0}")]
    Unavailable(String),

    /// The order has not been placed, so there is nothing to settle.
    #[error("Order has not been placed")]
    OrderNotPlaced,

    /// A deduction run stopped part way. Lines before the failure stay applied.
    #[error("Stock deduction for order {order_id} stopped after {applied} line(s): {source}")]
    Interrupted {
        order_id: OrderId,
        applied: usize,
        #[source]
        source: Box<StockError>,
    },
}

impl StockError {
    /// Returns true when a referenced ingredient is missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            StockError::IngredientNotFound(_) => true,
            StockError::Interrupted { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Returns true when the ingredient store could not be reached.
    pub fn is_unavailable(&self) -> bool {
        match self {
            StockError::Unavailable(_) => true,
            StockError::Interrupted { source, .. } => source.is_unavailable(),
            _ => false,
        }
    }
}

/// Convenience type alias for stock results.
pub type Result<T> = std::result::Result<T, StockError>;
