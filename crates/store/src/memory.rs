use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Cart, CartId, Order, OrderId, Product, ProductId, UserId};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{CartStore, OrderStore, ProductFilter, ProductStore},
};

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    carts: HashMap<CartId, Cart>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory store implementation for testing and local runs.
///
/// Provides the same interface and atomicity guarantees as the PostgreSQL
/// implementation: the composite lifecycle writes run under a single write
/// lock, so a failed placement leaves nothing behind.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all rows.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.products.clear();
        inner.carts.clear();
        inner.orders.clear();
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn save_product(&self, product: Product) -> Result<Product> {
        self.inner
            .write()
            .await
            .products
            .insert(product.id, product.clone());
        Ok(product)
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        Ok(self.inner.write().await.products.remove(&id).is_some())
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        let mut products: Vec<_> = inner
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn find_cart(&self, id: CartId) -> Result<Option<Cart>> {
        Ok(self.inner.read().await.carts.get(&id).cloned())
    }

    async fn find_cart_by_user(&self, user_id: UserId) -> Result<Option<Cart>> {
        let inner = self.inner.read().await;
        Ok(inner.carts.values().find(|c| c.user_id == user_id).cloned())
    }

    async fn save_cart(&self, cart: Cart) -> Result<Cart> {
        self.inner.write().await.carts.insert(cart.id, cart.clone());
        Ok(cart)
    }

    async fn delete_cart_items(&self, cart_id: CartId) -> Result<()> {
        let mut inner = self.inner.write().await;
        if let Some(cart) = inner.carts.get_mut(&cart_id) {
            cart.clear();
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&id).cloned())
    }

    async fn find_orders_by_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<_> = inner
            .orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.order_date);
        Ok(orders)
    }

    async fn save_order(&self, order: Order) -> Result<Order> {
        self.inner
            .write()
            .await
            .orders
            .insert(order.id, order.clone());
        Ok(order)
    }

    async fn commit_placement(&self, order: Order, cart_id: CartId) -> Result<Order> {
        let mut inner = self.inner.write().await;

        // Validate the whole write-set before touching anything, so a
        // failure on the third line cannot leave the first two debited.
        for item in &order.items {
            let product = inner.products.get(&item.product_id).ok_or_else(|| {
                StoreError::MissingRow {
                    entity: "product",
                    id: item.product_id.to_string(),
                }
            })?;
            if product.inventory < item.quantity {
                return Err(StoreError::InsufficientInventory {
                    product_id: item.product_id,
                });
            }
        }
        if !inner.carts.contains_key(&cart_id) {
            return Err(StoreError::MissingRow {
                entity: "cart",
                id: cart_id.to_string(),
            });
        }

        for item in &order.items {
            if let Some(product) = inner.products.get_mut(&item.product_id) {
                product.inventory -= item.quantity;
            }
        }
        if let Some(cart) = inner.carts.get_mut(&cart_id) {
            cart.clear();
        }
        inner.orders.insert(order.id, order.clone());

        Ok(order)
    }

    async fn commit_cancellation(&self, order: Order) -> Result<Order> {
        let mut inner = self.inner.write().await;

        // Re-check the stored status under the write lock; a racing cancel
        // that committed first must not be credited a second time.
        match inner.orders.get(&order.id) {
            Some(stored) if stored.is_cancelled() => {
                return Err(StoreError::AlreadyCancelled { order_id: order.id });
            }
            Some(_) => {}
            None => {
                return Err(StoreError::MissingRow {
                    entity: "order",
                    id: order.id.to_string(),
                });
            }
        }

        for item in &order.items {
            match inner.products.get_mut(&item.product_id) {
                Some(product) => product.inventory += item.quantity,
                // The product was deleted from the catalog after the order
                // was placed; there is no stock row left to credit.
                None => tracing::warn!(
                    product_id = %item.product_id,
                    "skipping inventory credit for deleted product"
                ),
            }
        }
        inner.orders.insert(order.id, order.clone());

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Money, OrderItem, OrderStatus};
    use chrono::Utc;

    fn product(inventory: u32) -> Product {
        Product::new(
            "Widget",
            "Acme",
            "A widget",
            "tools",
            Money::from_cents(500),
            inventory,
        )
    }

    async fn seeded_cart(store: &InMemoryStore, user_id: UserId) -> Cart {
        let cart = Cart::new(user_id);
        store.save_cart(cart.clone()).await.unwrap();
        cart
    }

    #[tokio::test]
    async fn product_roundtrip() {
        let store = InMemoryStore::new();
        let product = store.save_product(product(10)).await.unwrap();

        let found = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(found, product);

        assert!(store.delete_product(product.id).await.unwrap());
        assert!(!store.delete_product(product.id).await.unwrap());
        assert!(store.find_product(product.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_cart_by_user() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let cart = seeded_cart(&store, user_id).await;

        let found = store.find_cart_by_user(user_id).await.unwrap().unwrap();
        assert_eq!(found.id, cart.id);

        assert!(store.find_cart_by_user(UserId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn commit_placement_debits_and_clears() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let product = store.save_product(product(10)).await.unwrap();

        let mut cart = seeded_cart(&store, user_id).await;
        cart.add_item(product.id, 5, product.price);
        store.save_cart(cart.clone()).await.unwrap();

        let items = vec![OrderItem::new(product.id, "Widget", 5, product.price)];
        let order = Order::new(user_id, Utc::now().date_naive(), items);
        let order = store.commit_placement(order, cart.id).await.unwrap();

        let product = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.inventory, 5);

        let cart = store.find_cart(cart.id).await.unwrap().unwrap();
        assert!(cart.is_empty());
        assert!(cart.total.is_zero());

        assert!(store.find_order(order.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn commit_placement_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let plentiful = store.save_product(product(10)).await.unwrap();
        let scarce = store.save_product(product(1)).await.unwrap();

        let mut cart = seeded_cart(&store, user_id).await;
        cart.add_item(plentiful.id, 2, plentiful.price);
        cart.add_item(scarce.id, 3, scarce.price);
        store.save_cart(cart.clone()).await.unwrap();

        let items = vec![
            OrderItem::new(plentiful.id, "Widget", 2, plentiful.price),
            OrderItem::new(scarce.id, "Widget", 3, scarce.price),
        ];
        let order = Order::new(user_id, Utc::now().date_naive(), items);
        let err = store.commit_placement(order, cart.id).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientInventory { product_id } if product_id == scarce.id
        ));

        // Nothing was applied: no debit on the first line, cart intact.
        let plentiful = store.find_product(plentiful.id).await.unwrap().unwrap();
        assert_eq!(plentiful.inventory, 10);
        let cart = store.find_cart(cart.id).await.unwrap().unwrap();
        assert_eq!(cart.items.len(), 2);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn commit_cancellation_credits_and_updates_status() {
        let store = InMemoryStore::new();
        let product = store.save_product(product(5)).await.unwrap();

        let items = vec![OrderItem::new(product.id, "Widget", 5, product.price)];
        let mut order = Order::new(UserId::new(), Utc::now().date_naive(), items);
        store.save_order(order.clone()).await.unwrap();

        order.status = OrderStatus::Cancelled;
        store.commit_cancellation(order.clone()).await.unwrap();

        let product = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.inventory, 10);
        let stored = store.find_order(order.id).await.unwrap().unwrap();
        assert!(stored.is_cancelled());
    }

    #[tokio::test]
    async fn commit_cancellation_credits_only_once() {
        let store = InMemoryStore::new();
        let product = store.save_product(product(10)).await.unwrap();

        let items = vec![OrderItem::new(product.id, "Widget", 5, product.price)];
        let mut order = Order::new(UserId::new(), Utc::now().date_naive(), items);
        store.save_order(order.clone()).await.unwrap();

        // Two cancellations that each saw the order Pending. The stored
        // status is the guard, so only the first credits stock.
        order.status = OrderStatus::Cancelled;
        store.commit_cancellation(order.clone()).await.unwrap();
        let err = store.commit_cancellation(order.clone()).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::AlreadyCancelled { order_id } if order_id == order.id
        ));

        let product = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.inventory, 15);
    }

    #[tokio::test]
    async fn commit_cancellation_requires_a_stored_order() {
        let store = InMemoryStore::new();

        let mut order = Order::new(UserId::new(), Utc::now().date_naive(), vec![]);
        order.status = OrderStatus::Cancelled;
        let err = store.commit_cancellation(order).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingRow { entity: "order", .. }));
    }

    #[tokio::test]
    async fn list_products_applies_filters() {
        let store = InMemoryStore::new();
        store
            .save_product(Product::new(
                "Claw Hammer",
                "Acme",
                "",
                "tools",
                Money::from_cents(800),
                3,
            ))
            .await
            .unwrap();
        store
            .save_product(Product::new(
                "Garden Hose",
                "Verde",
                "",
                "garden",
                Money::from_cents(1200),
                2,
            ))
            .await
            .unwrap();

        let all = store.list_products(&ProductFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let tools = store
            .list_products(&ProductFilter {
                category: Some("tools".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "Claw Hammer");

        let hammers = store
            .list_products(&ProductFilter {
                name: Some("hammer".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hammers.len(), 1);

        let none = store
            .list_products(&ProductFilter {
                brand: Some("Acme".into()),
                category: Some("garden".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}
