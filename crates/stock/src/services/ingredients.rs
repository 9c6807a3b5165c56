//! Ingredient store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StockError};

/// A stocked ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    /// Unit the stock is counted in, e.g. "g", "ml", "pcs".
    pub unit: String,
    pub stock: f64,
    pub low_stock_threshold: f64,
}

impl Ingredient {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        unit: impl Into<String>,
        stock: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit: unit.into(),
            stock,
            low_stock_threshold: 0.0,
        }
    }

    pub fn with_low_stock_threshold(mut self, threshold: f64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn is_low(&self) -> bool {
        self.stock <= self.low_stock_threshold
    }
}

/// Outcome of a single deduction.
#[derive(Debug, Clone, PartialEq)]
pub struct Deduction {
    pub ingredient_id: String,
    pub requested: f64,
    /// What was actually taken; less than `requested` when clamped.
    pub applied: f64,
    pub remaining: f64,
}

impl Deduction {
    pub fn clamped(&self) -> bool {
        self.applied < self.requested
    }
}

/// Trait for ingredient stock operations.
#[async_trait]
pub trait IngredientStore: Send + Sync {
    /// Looks up an ingredient.
    async fn ingredient(&self, id: &str) -> Result<Option<Ingredient>>;

    /// Takes `quantity` out of stock. Stock never goes below zero: a
    /// larger request empties it and succeeds.
    async fn deduct(&self, id: &str, quantity: f64) -> Result<Deduction>;
}

#[derive(Debug, Default)]
struct InMemoryIngredientState {
    ingredients: HashMap<String, Ingredient>,
    deduct_calls: usize,
    fail_on_deduct: Option<String>,
}

/// In-memory ingredient store for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIngredientStore {
    state: Arc<RwLock<InMemoryIngredientState>>,
}

impl InMemoryIngredientStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an ingredient, builder style.
    pub fn with_ingredient(self, ingredient: Ingredient) -> Self {
        self.insert(ingredient);
        self
    }

    pub fn insert(&self, ingredient: Ingredient) {
        self.write()
            .ingredients
            .insert(ingredient.id.clone(), ingredient);
    }

    /// Makes deductions of the given ingredient fail as if the store were
    /// unreachable. `None` clears the fault.
    pub fn set_fail_on_deduct(&self, ingredient_id: Option<&str>) {
        self.write().fail_on_deduct = ingredient_id.map(str::to_string);
    }

    /// Returns the current stock of an ingredient.
    pub fn stock_of(&self, id: &str) -> Option<f64> {
        self.read().ingredients.get(id).map(|i| i.stock)
    }

    /// Returns how many deduct calls were received, failed ones included.
    pub fn deduct_calls(&self) -> usize {
        self.read().deduct_calls
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, InMemoryIngredientState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryIngredientState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl IngredientStore for InMemoryIngredientStore {
    async fn ingredient(&self, id: &str) -> Result<Option<Ingredient>> {
        Ok(self.read().ingredients.get(id).cloned())
    }

    async fn deduct(&self, id: &str, quantity: f64) -> Result<Deduction> {
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(StockError::InvalidQuantity {
                ingredient_id: id.to_string(),
                quantity,
            });
        }

        let mut state = self.write();
        state.deduct_calls += 1;

        if state.fail_on_deduct.as_deref() == Some(id) {
            return Err(StockError::Unavailable(format!(
                "deduct {id}: connection reset"
            )));
        }

        let ingredient = state
            .ingredients
            .get_mut(id)
            .ok_or_else(|| StockError::IngredientNotFound(id.to_string()))?;

        let applied = quantity.min(ingredient.stock.max(0.0));
        if applied < quantity {
            tracing::warn!(
                ingredient = %ingredient.name,
                requested = quantity,
                available = ingredient.stock,
                unit = %ingredient.unit,
                "insufficient stock, clamping to zero"
            );
        }
        ingredient.stock = (ingredient.stock - applied).max(0.0);

        if ingredient.is_low() {
            tracing::warn!(
                ingredient = %ingredient.name,
                remaining = ingredient.stock,
                threshold = ingredient.low_stock_threshold,
                unit = %ingredient.unit,
                "ingredient stock is low"
            );
        }

        Ok(Deduction {
            ingredient_id: id.to_string(),
            requested: quantity,
            applied,
            remaining: ingredient.stock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryIngredientStore {
        InMemoryIngredientStore::new()
            .with_ingredient(Ingredient::new("milk", "Milk", "ml", 1000.0).with_low_stock_threshold(200.0))
    }

    #[tokio::test]
    async fn test_deduct_reduces_stock() {
        let store = store();
        let deduction = store.deduct("milk", 250.0).await.unwrap();

        assert_eq!(deduction.applied, 250.0);
        assert_eq!(deduction.remaining, 750.0);
        assert!(!deduction.clamped());
        assert_eq!(store.stock_of("milk"), Some(750.0));
    }

    #[tokio::test]
    async fn test_deduct_clamps_at_zero() {
        let store = store();
        let deduction = store.deduct("milk", 1500.0).await.unwrap();

        assert!(deduction.clamped());
        assert_eq!(deduction.applied, 1000.0);
        assert_eq!(store.stock_of("milk"), Some(0.0));

        let again = store.deduct("milk", 10.0).await.unwrap();
        assert_eq!(again.applied, 0.0);
        assert_eq!(store.stock_of("milk"), Some(0.0));
    }

    #[tokio::test]
    async fn test_unknown_ingredient() {
        let result = store().deduct("sugar", 1.0).await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_negative_quantity_rejected() {
        let result = store().deduct("milk", -1.0).await;
        assert!(matches!(result, Err(StockError::InvalidQuantity { .. })));
    }

    #[tokio::test]
    async fn test_fail_on_deduct() {
        let store = store();
        store.set_fail_on_deduct(Some("milk"));

        let result = store.deduct("milk", 1.0).await;
        assert!(result.unwrap_err().is_unavailable());
        assert_eq!(store.stock_of("milk"), Some(1000.0));
        assert_eq!(store.deduct_calls(), 1);

        store.set_fail_on_deduct(None);
        assert!(store.deduct("milk", 1.0).await.is_ok());
    }

    #[tokio::test]
    async fn test_ingredient_lookup() {
        let store = store();
        let milk = store.ingredient("milk").await.unwrap().unwrap();
        assert_eq!(milk.unit, "ml");
        assert!(store.ingredient("sugar").await.unwrap().is_none());
    }
}
