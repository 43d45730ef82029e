//! Catalog entity types.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::ProductId;

/// A product in the catalog.
///
/// Inventory is mutated only by order placement/cancellation and by catalog
/// admin edits; carts never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub description: String,
    /// Category label the product is listed under.
    pub category: String,
    /// Price per unit.
    pub price: Money,
    /// Units in stock.
    pub inventory: u32,
}

impl Product {
    /// Creates a new product with a fresh identifier.
    pub fn new(
        name: impl Into<String>,
        brand: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        price: Money,
        inventory: u32,
    ) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            brand: brand.into(),
            description: description.into(),
            category: category.into(),
            price,
            inventory,
        }
    }

    /// Returns true if at least `quantity` units are in stock.
    pub fn has_stock(&self, quantity: u32) -> bool {
        self.inventory >= quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_stock_boundaries() {
        let product = Product::new("Widget", "Acme", "", "tools", Money::from_cents(500), 3);
        assert!(product.has_stock(3));
        assert!(!product.has_stock(4));
    }
}
