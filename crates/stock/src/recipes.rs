//! Recipes: how much of each ingredient one unit of a menu item consumes.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use domain::MenuItemId;
use serde::{Deserialize, Serialize};

/// One ingredient requirement of a recipe, per unit sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub ingredient_id: String,
    pub quantity: f64,
}

impl RecipeLine {
    pub fn new(ingredient_id: impl Into<String>, quantity: f64) -> Self {
        Self {
            ingredient_id: ingredient_id.into(),
            quantity,
        }
    }
}

/// Ingredient list for a menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub menu_item_id: MenuItemId,
    pub lines: Vec<RecipeLine>,
}

impl Recipe {
    pub fn new(
        id: impl Into<String>,
        menu_item_id: impl Into<MenuItemId>,
        lines: Vec<RecipeLine>,
    ) -> Self {
        Self {
            id: id.into(),
            menu_item_id: menu_item_id.into(),
            lines,
        }
    }
}

/// Read-only recipe lookup by menu item.
pub trait RecipeBook: Send + Sync {
    fn recipe_for(&self, menu_item_id: &MenuItemId) -> Option<Recipe>;
}

/// In-memory recipe book for tests and single-process setups.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecipeBook {
    recipes: Arc<RwLock<HashMap<MenuItemId, Recipe>>>,
}

impl InMemoryRecipeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a recipe, builder style.
    pub fn with_recipe(self, recipe: Recipe) -> Self {
        self.insert(recipe);
        self
    }

    /// Adds or replaces the recipe of a menu item.
    pub fn insert(&self, recipe: Recipe) {
        self.recipes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(recipe.menu_item_id.clone(), recipe);
    }
}

impl RecipeBook for InMemoryRecipeBook {
    fn recipe_for(&self, menu_item_id: &MenuItemId) -> Option<Recipe> {
        self.recipes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(menu_item_id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_menu_item() {
        let book = InMemoryRecipeBook::new().with_recipe(Recipe::new(
            "r-latte",
            "latte",
            vec![RecipeLine::new("milk", 0.2), RecipeLine::new("beans", 18.0)],
        ));

        let recipe = book.recipe_for(&"latte".into()).unwrap();
        assert_eq!(recipe.lines.len(), 2);
        assert!(book.recipe_for(&"bagel".into()).is_none());
    }
}
