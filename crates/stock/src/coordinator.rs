//! Stock deduction coordinator.

use common::OrderId;
use domain::{MenuItemId, Order};

use crate::error::{Result, StockError};
use crate::recipes::RecipeBook;
use crate::services::{Deduction, IngredientStore};

/// What one deduction run did.
#[derive(Debug, Clone, PartialEq)]
pub struct DeductionReport {
    pub order_id: OrderId,
    /// One entry per recipe line, in the order they were applied.
    pub deductions: Vec<Deduction>,
    /// Menu items of the order that have no recipe.
    pub skipped: Vec<MenuItemId>,
}

impl DeductionReport {
    fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            deductions: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Total quantity requested from one ingredient across all lines.
    pub fn requested_for(&self, ingredient_id: &str) -> f64 {
        self.deductions
            .iter()
            .filter(|d| d.ingredient_id == ingredient_id)
            .map(|d| d.requested)
            .sum()
    }

    /// Returns true if any line hit an empty stock.
    pub fn any_clamped(&self) -> bool {
        self.deductions.iter().any(Deduction::clamped)
    }
}

/// Depletes ingredient stock for a paid order.
///
/// Callers run this once per order, for the write whose result carries the
/// order's `StockSettled` event; the coordinator itself keeps no record of
/// what it already processed.
///
/// Each recipe line is an independent call to the ingredient store. There
/// is no transaction across lines: if one fails, the lines before it stay
/// applied and the error reports how many there were.
pub struct StockDeductionCoordinator<R, I>
where
    R: RecipeBook,
    I: IngredientStore,
{
    recipes: R,
    ingredients: I,
}

impl<R, I> StockDeductionCoordinator<R, I>
where
    R: RecipeBook,
    I: IngredientStore,
{
    /// Creates a new coordinator.
    pub fn new(recipes: R, ingredients: I) -> Self {
        Self {
            recipes,
            ingredients,
        }
    }

    pub fn recipes(&self) -> &R {
        &self.recipes
    }

    pub fn ingredients(&self) -> &I {
        &self.ingredients
    }

    /// Deducts the ingredients consumed by every active item of `order`.
    #[tracing::instrument(skip(self, order), fields(order_id = ?order.id()))]
    pub async fn deduct_for_order(&self, order: &Order) -> Result<DeductionReport> {
        let order_id = order.id().ok_or(StockError::OrderNotPlaced)?;
        let mut report = DeductionReport::new(order_id);

        for item in order.items().iter().filter(|i| i.status.is_active()) {
            let Some(recipe) = self.recipes.recipe_for(&item.menu_item_id) else {
                tracing::debug!(menu_item = %item.menu_item_id, "no recipe, skipping");
                report.skipped.push(item.menu_item_id.clone());
                continue;
            };

            for line in &recipe.lines {
                let quantity = line.quantity * f64::from(item.quantity);
                match self.ingredients.deduct(&line.ingredient_id, quantity).await {
                    Ok(deduction) => {
                        if deduction.clamped() {
                            metrics::counter!("stock_clamped_total").increment(1);
                        }
                        report.deductions.push(deduction);
                    }
                    Err(e) => {
                        tracing::error!(
                            ingredient = %line.ingredient_id,
                            applied = report.deductions.len(),
                            error = %e,
                            "stock deduction interrupted"
                        );
                        return Err(StockError::Interrupted {
                            order_id,
                            applied: report.deductions.len(),
                            source: Box::new(e),
                        });
                    }
                }
            }
        }

        metrics::counter!("stock_deductions_total").increment(1);
        tracing::info!(
            lines = report.deductions.len(),
            skipped = report.skipped.len(),
            "stock deducted for order"
        );
        Ok(report)
    }
}
