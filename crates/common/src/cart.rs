//! Cart aggregate types.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{CartId, ProductId, UserId};

/// One product line within a cart.
///
/// `unit_price` is a snapshot of the product price at the time the line was
/// first added; the line total is always derived from it rather than stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

impl CartItem {
    /// Creates a new cart line.
    pub fn new(product_id: ProductId, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
        }
    }

    /// Returns the line total (`unit_price × quantity`).
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// A per-user mutable collection of pending purchase lines.
///
/// Invariant: `total == Σ item.total_price()` after every mutation. All
/// mutating methods recompute the total before returning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub total: Money,
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Creates an empty cart bound to a user.
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: CartId::new(),
            user_id,
            total: Money::zero(),
            items: Vec::new(),
        }
    }

    /// Returns the line for a product, if present.
    pub fn item_for(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Quantity of a product already in the cart (0 if absent).
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.item_for(product_id).map_or(0, |i| i.quantity)
    }

    /// Adds `quantity` of a product, merging into an existing line.
    ///
    /// `unit_price` is only used when the line does not exist yet; a merged
    /// line keeps its original price snapshot. Returns false, leaving the
    /// cart unchanged, when the merged quantity would overflow.
    pub fn add_item(&mut self, product_id: ProductId, quantity: u32, unit_price: Money) -> bool {
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => match item.quantity.checked_add(quantity) {
                Some(merged) => item.quantity = merged,
                None => return false,
            },
            None => self.items.push(CartItem::new(product_id, quantity, unit_price)),
        }
        self.recompute_total();
        true
    }

    /// Removes the line for a product. Returns false if no such line exists.
    pub fn remove_item(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        let removed = self.items.len() != before;
        if removed {
            self.recompute_total();
        }
        removed
    }

    /// Sets the quantity on an existing line. Returns false if absent.
    pub fn set_item_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                self.recompute_total();
                true
            }
            None => false,
        }
    }

    /// Deletes all lines and zeroes the total.
    pub fn clear(&mut self) {
        self.items.clear();
        self.total = Money::zero();
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Recomputes the total from the lines.
    pub fn recompute_total(&mut self) {
        self.total = self.items.iter().map(CartItem::total_price).sum();
    }
}
