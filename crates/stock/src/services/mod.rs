//! External stock collaborators and in-memory implementations.

pub mod ingredients;

pub use ingredients::{Deduction, InMemoryIngredientStore, Ingredient, IngredientStore};
