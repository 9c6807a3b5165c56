//! Menu catalog lookups used when building an order's items.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::order::{MenuItemId, Money};

/// A sellable menu entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    /// Current catalog price. Orders snapshot it at placement time.
    pub price: Money,
    pub category_id: String,
    pub is_available: bool,
}

impl MenuItem {
    pub fn new(
        id: impl Into<MenuItemId>,
        name: impl Into<String>,
        price: Money,
        category_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            category_id: category_id.into(),
            is_available: true,
        }
    }
}

/// Read-only menu lookup. Administration of the menu lives elsewhere.
pub trait MenuCatalog: Send + Sync {
    fn menu_item(&self, id: &MenuItemId) -> Option<MenuItem>;
}

/// In-memory catalog for tests and single-process setups.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMenuCatalog {
    items: Arc<RwLock<HashMap<MenuItemId, MenuItem>>>,
}

impl InMemoryMenuCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an item, builder style.
    pub fn with_item(self, item: MenuItem) -> Self {
        self.insert(item);
        self
    }

    /// Adds or replaces an item.
    pub fn insert(&self, item: MenuItem) {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(item.id.clone(), item);
    }

    /// Changes the catalog price of an item, if present.
    pub fn set_price(&self, id: &MenuItemId, price: Money) {
        if let Some(item) = self
            .items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(id)
        {
            item.price = price;
        }
    }
}

impl MenuCatalog for InMemoryMenuCatalog {
    fn menu_item(&self, id: &MenuItemId) -> Option<MenuItem> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_and_price_change() {
        let catalog = InMemoryMenuCatalog::new().with_item(MenuItem::new(
            "latte",
            "Latte",
            Money::from_major(150),
            "coffee",
        ));

        let id = MenuItemId::new("latte");
        assert_eq!(catalog.menu_item(&id).unwrap().price, Money::from_major(150));

        catalog.set_price(&id, Money::from_major(160));
        assert_eq!(catalog.menu_item(&id).unwrap().price, Money::from_major(160));

        assert!(catalog.menu_item(&MenuItemId::new("missing")).is_none());
    }
}
