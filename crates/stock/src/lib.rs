//! Ingredient stock for the order lifecycle.
//!
//! This crate provides:
//! - Recipe and ingredient contracts with in-memory implementations
//! - StockDeductionCoordinator, which depletes stock once an order is
//!   settled

pub mod coordinator;
pub mod error;
pub mod recipes;
pub mod services;

pub use coordinator::{DeductionReport, StockDeductionCoordinator};
pub use error::{Result, StockError};
pub use recipes::{InMemoryRecipeBook, Recipe, RecipeBook, RecipeLine};
pub use services::{Deduction, InMemoryIngredientStore, Ingredient, IngredientStore};
