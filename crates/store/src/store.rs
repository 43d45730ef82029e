use async_trait::async_trait;
use common::{Cart, CartId, Order, OrderId, Product, ProductId, UserId};

use crate::Result;

/// Filter for catalog listings. `None` fields match everything.
///
/// `category` and `brand` match exactly; `name` matches a case-insensitive
/// substring of the product name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub name: Option<String>,
}

impl ProductFilter {
    /// Returns true if the product satisfies every set field.
    pub fn matches(&self, product: &Product) -> bool {
        self.category
            .as_deref()
            .is_none_or(|c| product.category == c)
            && self.brand.as_deref().is_none_or(|b| product.brand == b)
            && self
                .name
                .as_deref()
                .is_none_or(|n| product.name.to_lowercase().contains(&n.to_lowercase()))
    }
}

/// Product lookup and persistence.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Finds a product by id. Returns None if absent.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Inserts or updates a product.
    async fn save_product(&self, product: Product) -> Result<Product>;

    /// Deletes a product. Returns false if no such row existed.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    /// Lists the products satisfying a filter (all of them for the
    /// default filter).
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;
}

/// Cart lookup and persistence.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Finds a cart by id, with its items. Returns None if absent.
    async fn find_cart(&self, id: CartId) -> Result<Option<Cart>>;

    /// Finds the cart owned by a user. Returns None if the user has none.
    async fn find_cart_by_user(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Inserts or updates a cart.
    ///
    /// The cart's item rows are replaced to match `cart.items` in the same
    /// transaction as the parent row, so the persisted aggregate can never
    /// be half-written.
    async fn save_cart(&self, cart: Cart) -> Result<Cart>;

    /// Deletes all item rows for a cart. The parent row stays.
    async fn delete_cart_items(&self, cart_id: CartId) -> Result<()>;
}

/// Order lookup and the atomic lifecycle writes.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Finds an order by id, with its items. Returns None if absent.
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Lists all orders placed by a user.
    async fn find_orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Inserts or updates an order and its item rows.
    async fn save_order(&self, order: Order) -> Result<Order>;

    /// Commits an order placement atomically.
    ///
    /// In one transaction: debits inventory for every order line with a
    /// guarded check-and-decrement (failing with
    /// [`StoreError::InsufficientInventory`](crate::StoreError::InsufficientInventory)
    /// rather than going negative), inserts the order and its items, and
    /// clears the source cart (item rows deleted, total zeroed). Either the
    /// whole write-set applies or none of it does.
    async fn commit_placement(&self, order: Order, cart_id: CartId) -> Result<Order>;

    /// Commits an order cancellation atomically.
    ///
    /// In one transaction: flips the persisted status from pending with a
    /// guarded update, then credits inventory back for every order line.
    /// A racing cancellation that committed first makes the guard fail with
    /// [`StoreError::AlreadyCancelled`](crate::StoreError::AlreadyCancelled),
    /// so stock is credited exactly once.
    async fn commit_cancellation(&self, order: Order) -> Result<Order>;
}

/// Everything the domain services need from a backend.
pub trait CommerceStore: ProductStore + CartStore + OrderStore {}

impl<T: ProductStore + CartStore + OrderStore> CommerceStore for T {}
