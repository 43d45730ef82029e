//! Order lifecycle service: placement and cancellation.

use chrono::Utc;
use common::{Order, OrderId, OrderItem, OrderStatus, UserId};
use store::CommerceStore;

use crate::access::{AccessGuard, require_owner, require_owner_or_admin};
use crate::error::CommerceError;

/// Policy knobs for the order lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct OrderPolicy {
    /// Maximum age, in days, at which an order may still be cancelled.
    pub max_cancel_days: i64,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self { max_cancel_days: 3 }
    }
}

/// Service converting carts into orders and reversing that within a window.
///
/// Placement and cancellation each hand the store a complete write-set
/// (inventory adjustments plus order rows plus cart clearing) that is
/// committed atomically; a failure anywhere leaves no partial state.
pub struct OrderService<S> {
    store: S,
    policy: OrderPolicy,
}

impl<S: CommerceStore> OrderService<S> {
    /// Creates an order service with the default policy.
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: OrderPolicy::default(),
        }
    }

    /// Creates an order service with an explicit policy.
    pub fn with_policy(store: S, policy: OrderPolicy) -> Self {
        Self { store, policy }
    }

    /// Places an order from the user's cart.
    ///
    /// Builds one order line per cart line, snapshotting the current product
    /// price (not the cart's earlier snapshot), then commits inventory
    /// debits, order creation, and cart clearing as one unit of work.
    #[tracing::instrument(skip(self, guard))]
    pub async fn place_order(
        &self,
        guard: &dyn AccessGuard,
        user_id: UserId,
    ) -> Result<Order, CommerceError> {
        require_owner_or_admin(guard, user_id)?;

        let cart = self
            .store
            .find_cart_by_user(user_id)
            .await?
            .ok_or_else(|| CommerceError::NotFound("Cart not found".into()))?;

        if cart.is_empty() {
            return Err(CommerceError::BadRequest("Order items are empty".into()));
        }

        let mut items = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let product = self
                .store
                .find_product(line.product_id)
                .await?
                .ok_or_else(|| CommerceError::NotFound("Product not found".into()))?;

            if !product.has_stock(line.quantity) {
                return Err(CommerceError::BadRequest(format!(
                    "Inventory is not enough for product: {}",
                    product.name
                )));
            }
            items.push(OrderItem::new(
                product.id,
                product.name.clone(),
                line.quantity,
                product.price,
            ));
        }

        let order = Order::new(user_id, Utc::now().date_naive(), items);
        let order = self.store.commit_placement(order, cart.id).await?;

        metrics::counter!("orders_placed_total").increment(1);
        tracing::info!(order_id = %order.id, %user_id, total = %order.total, "order placed");
        Ok(order)
    }

    /// Cancels an order, crediting inventory back.
    ///
    /// Only the owning user may cancel; admins are deliberately not granted
    /// cancellation of other users' orders. Cancellation is refused once the
    /// order is older than the policy window or already cancelled.
    #[tracing::instrument(skip(self, guard))]
    pub async fn cancel_order(
        &self,
        guard: &dyn AccessGuard,
        order_id: OrderId,
    ) -> Result<Order, CommerceError> {
        let mut order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| CommerceError::NotFound("Order not found".into()))?;

        require_owner(guard, order.user_id)?;

        if order.is_cancelled() {
            return Err(CommerceError::BadRequest("Order already cancelled".into()));
        }

        let days = order.days_since_order(Utc::now().date_naive());
        if days > self.policy.max_cancel_days {
            return Err(CommerceError::BadRequest(format!(
                "Order cannot be cancelled after {} days. Please contact support for further assistance.",
                self.policy.max_cancel_days
            )));
        }

        order.status = OrderStatus::Cancelled;
        let order = self.store.commit_cancellation(order).await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %order.id, "order cancelled");
        Ok(order)
    }

    /// Loads an order by id. Owner or admin only.
    #[tracing::instrument(skip(self, guard))]
    pub async fn get_order(
        &self,
        guard: &dyn AccessGuard,
        order_id: OrderId,
    ) -> Result<Order, CommerceError> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| CommerceError::NotFound("Order not found".into()))?;
        require_owner_or_admin(guard, order.user_id)?;
        Ok(order)
    }

    /// Lists a user's orders. Owner or admin only.
    #[tracing::instrument(skip(self, guard))]
    pub async fn get_orders_for_user(
        &self,
        guard: &dyn AccessGuard,
        user_id: UserId,
    ) -> Result<Vec<Order>, CommerceError> {
        require_owner_or_admin(guard, user_id)?;
        Ok(self.store.find_orders_by_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::FixedGuard;
    use crate::cart::CartService;
    use common::{Money, Product, ProductId};
    use store::{CartStore, InMemoryStore, OrderStore, ProductStore};

    async fn seed_product(store: &InMemoryStore, inventory: u32) -> Product {
        store
            .save_product(Product::new(
                "Widget",
                "Acme",
                "A widget",
                "tools",
                Money::from_cents(500),
                inventory,
            ))
            .await
            .unwrap()
    }

    async fn fill_cart(store: &InMemoryStore, user_id: UserId, product_id: ProductId, qty: u32) {
        CartService::new(store.clone())
            .add_item(&FixedGuard::user(user_id), user_id, product_id, qty)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn place_order_debits_inventory_and_empties_cart() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store.clone());
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);
        let product = seed_product(&store, 10).await;
        fill_cart(&store, user_id, product.id, 5).await;

        let order = service.place_order(&guard, user_id).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 5);
        assert_eq!(order.items[0].price.cents(), 500);
        assert_eq!(order.total.cents(), 2500);

        let product = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.inventory, 5);

        let cart = store.find_cart_by_user(user_id).await.unwrap().unwrap();
        assert!(cart.is_empty());
        assert!(cart.total.is_zero());
    }

    #[tokio::test]
    async fn order_lines_snapshot_current_price_not_cart_price() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store.clone());
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);
        let mut product = seed_product(&store, 10).await;
        fill_cart(&store, user_id, product.id, 2).await;

        // Price changes between add and placement.
        product.price = Money::from_cents(700);
        store.save_product(product).await.unwrap();

        let order = service.place_order(&guard, user_id).await.unwrap();
        assert_eq!(order.items[0].price.cents(), 700);
        assert_eq!(order.total.cents(), 1400);
    }

    #[tokio::test]
    async fn place_order_without_cart_is_not_found() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store.clone());
        let user_id = UserId::new();

        let err = service
            .place_order(&FixedGuard::user(user_id), user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::NotFound(_)));
    }

    #[tokio::test]
    async fn place_order_on_empty_cart_creates_nothing() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store.clone());
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);

        store
            .save_cart(common::Cart::new(user_id))
            .await
            .unwrap();

        let err = service.place_order(&guard, user_id).await.unwrap_err();
        assert!(matches!(err, CommerceError::BadRequest(_)));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn place_order_fails_without_debiting_when_stock_is_short() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store.clone());
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);
        let product = seed_product(&store, 3).await;
        fill_cart(&store, user_id, product.id, 5).await;

        let err = service.place_order(&guard, user_id).await.unwrap_err();
        assert!(matches!(err, CommerceError::BadRequest(_)));

        let product = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.inventory, 3);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn cancel_restores_inventory_once() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store.clone());
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);
        let product = seed_product(&store, 10).await;
        fill_cart(&store, user_id, product.id, 5).await;

        let order = service.place_order(&guard, user_id).await.unwrap();
        let order = service.cancel_order(&guard, order.id).await.unwrap();
        assert!(order.is_cancelled());

        let restocked = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(restocked.inventory, 10);

        // Second cancellation is refused and credits nothing further.
        let err = service.cancel_order(&guard, order.id).await.unwrap_err();
        assert!(matches!(err, CommerceError::BadRequest(_)));
        let restocked = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(restocked.inventory, 10);
    }

    #[tokio::test]
    async fn cancel_outside_window_changes_nothing() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store.clone());
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);
        let product = seed_product(&store, 5).await;

        // An order placed four days ago, outside the default 3-day window.
        let items = vec![OrderItem::new(product.id, "Widget", 5, product.price)];
        let order_date = Utc::now().date_naive() - chrono::Days::new(4);
        let order = Order::new(user_id, order_date, items);
        store.save_order(order.clone()).await.unwrap();

        let err = service.cancel_order(&guard, order.id).await.unwrap_err();
        assert!(matches!(err, CommerceError::BadRequest(_)));

        let stored = store.find_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        let product = store.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.inventory, 5);
    }

    #[tokio::test]
    async fn cancel_at_window_boundary_is_allowed() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store.clone());
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);
        let product = seed_product(&store, 5).await;

        let items = vec![OrderItem::new(product.id, "Widget", 2, product.price)];
        let order_date = Utc::now().date_naive() - chrono::Days::new(3);
        let order = Order::new(user_id, order_date, items);
        store.save_order(order.clone()).await.unwrap();

        let order = service.cancel_order(&guard, order.id).await.unwrap();
        assert!(order.is_cancelled());
    }

    #[tokio::test]
    async fn cancellation_is_owner_only() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store.clone());
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);
        let product = seed_product(&store, 10).await;
        fill_cart(&store, user_id, product.id, 1).await;

        let order = service.place_order(&guard, user_id).await.unwrap();

        // Neither a stranger nor an admin may cancel another user's order.
        let err = service
            .cancel_order(&FixedGuard::user(UserId::new()), order.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Forbidden));

        let err = service
            .cancel_order(&FixedGuard::admin(UserId::new()), order.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Forbidden));
    }

    #[tokio::test]
    async fn reads_are_owner_or_admin() {
        let store = InMemoryStore::new();
        let service = OrderService::new(store.clone());
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);
        let product = seed_product(&store, 10).await;
        fill_cart(&store, user_id, product.id, 1).await;

        let order = service.place_order(&guard, user_id).await.unwrap();

        assert!(service.get_order(&guard, order.id).await.is_ok());
        assert!(
            service
                .get_order(&FixedGuard::admin(UserId::new()), order.id)
                .await
                .is_ok()
        );
        assert!(matches!(
            service
                .get_order(&FixedGuard::user(UserId::new()), order.id)
                .await,
            Err(CommerceError::Forbidden)
        ));
        assert!(matches!(
            service
                .get_orders_for_user(&FixedGuard::anonymous(), user_id)
                .await,
            Err(CommerceError::Unauthorized)
        ));

        let orders = service.get_orders_for_user(&guard, user_id).await.unwrap();
        assert_eq!(orders.len(), 1);
    }
}
