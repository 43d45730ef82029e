//! Cart aggregate service.

use common::{Cart, CartId, ProductId, UserId};
use store::CommerceStore;

use crate::access::{AccessGuard, require_owner_or_admin};
use crate::error::CommerceError;

/// Policy knobs for cart mutation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CartPolicy {
    /// When set, `add_item` refuses to promise more units than are in
    /// stock (counting what the cart line already holds). Off by default:
    /// stock is authoritatively checked at placement time either way.
    pub enforce_inventory: bool,
}

/// Service maintaining a single cart per user and its line items.
///
/// Every mutation recomputes the cart total before persisting, so the
/// invariant `total == Σ line totals` holds for every stored cart.
pub struct CartService<S> {
    store: S,
    policy: CartPolicy,
}

impl<S: CommerceStore> CartService<S> {
    /// Creates a cart service with the default policy.
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: CartPolicy::default(),
        }
    }

    /// Creates a cart service with an explicit policy.
    pub fn with_policy(store: S, policy: CartPolicy) -> Self {
        Self { store, policy }
    }

    /// Loads a cart by id. Owner or admin only.
    #[tracing::instrument(skip(self, guard))]
    pub async fn get_cart(
        &self,
        guard: &dyn AccessGuard,
        cart_id: CartId,
    ) -> Result<Cart, CommerceError> {
        let cart = self
            .store
            .find_cart(cart_id)
            .await?
            .ok_or_else(|| CommerceError::NotFound("Cart not found".into()))?;
        require_owner_or_admin(guard, cart.user_id)?;
        Ok(cart)
    }

    /// Loads the cart owned by a user. Owner or admin only.
    #[tracing::instrument(skip(self, guard))]
    pub async fn get_cart_for_user(
        &self,
        guard: &dyn AccessGuard,
        user_id: UserId,
    ) -> Result<Cart, CommerceError> {
        require_owner_or_admin(guard, user_id)?;
        self.store
            .find_cart_by_user(user_id)
            .await?
            .ok_or_else(|| CommerceError::NotFound("Cart not found".into()))
    }

    /// Adds `quantity` of a product to the user's cart, creating the cart
    /// lazily on first use. An existing line for the product is merged and
    /// keeps its original price snapshot; a new line snapshots the current
    /// product price.
    #[tracing::instrument(skip(self, guard))]
    pub async fn add_item(
        &self,
        guard: &dyn AccessGuard,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        require_owner_or_admin(guard, user_id)?;
        if quantity == 0 {
            return Err(CommerceError::BadRequest(
                "Quantity must be greater than zero".into(),
            ));
        }

        let product = self
            .store
            .find_product(product_id)
            .await?
            .ok_or_else(|| CommerceError::NotFound("Product not found".into()))?;

        let mut cart = match self.store.find_cart_by_user(user_id).await? {
            Some(cart) => cart,
            None => Cart::new(user_id),
        };

        if self.policy.enforce_inventory {
            // Saturating: a promised quantity past u32::MAX exceeds any stock.
            let wanted = cart.quantity_of(product_id).saturating_add(quantity);
            if !product.has_stock(wanted) {
                return Err(CommerceError::BadRequest(format!(
                    "Inventory is not enough for product: {}",
                    product.name
                )));
            }
        }

        if !cart.add_item(product_id, quantity, product.price) {
            return Err(CommerceError::BadRequest("Quantity is too large".into()));
        }
        let cart = self.store.save_cart(cart).await?;

        metrics::counter!("cart_items_added_total").increment(1);
        tracing::debug!(cart_id = %cart.id, %product_id, quantity, "added item to cart");
        Ok(cart)
    }

    /// Removes the line for a product from a cart.
    #[tracing::instrument(skip(self, guard))]
    pub async fn remove_item(
        &self,
        guard: &dyn AccessGuard,
        cart_id: CartId,
        product_id: ProductId,
    ) -> Result<Cart, CommerceError> {
        let mut cart = self.get_cart(guard, cart_id).await?;

        if !cart.remove_item(product_id) {
            return Err(CommerceError::NotFound("Cart item not found".into()));
        }
        Ok(self.store.save_cart(cart).await?)
    }

    /// Sets the quantity on an existing line.
    #[tracing::instrument(skip(self, guard))]
    pub async fn update_item_quantity(
        &self,
        guard: &dyn AccessGuard,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, CommerceError> {
        if quantity == 0 {
            return Err(CommerceError::BadRequest(
                "Quantity must be greater than zero".into(),
            ));
        }
        let mut cart = self.get_cart(guard, cart_id).await?;

        if !cart.set_item_quantity(product_id, quantity) {
            return Err(CommerceError::NotFound("Cart item not found".into()));
        }
        Ok(self.store.save_cart(cart).await?)
    }

    /// Deletes all lines for a cart and zeroes its total. The cart row
    /// itself survives for reuse.
    #[tracing::instrument(skip(self, guard))]
    pub async fn clear_cart(
        &self,
        guard: &dyn AccessGuard,
        cart_id: CartId,
    ) -> Result<(), CommerceError> {
        // Authorization first; the load also confirms the cart exists.
        self.get_cart(guard, cart_id).await?;
        self.store.delete_cart_items(cart_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::FixedGuard;
    use common::{Money, Product};
    use store::{InMemoryStore, ProductStore};

    async fn seed_product(store: &InMemoryStore, price_cents: i64, inventory: u32) -> Product {
        store
            .save_product(Product::new(
                "Widget",
                "Acme",
                "A widget",
                "tools",
                Money::from_cents(price_cents),
                inventory,
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn add_item_creates_cart_lazily() {
        let store = InMemoryStore::new();
        let service = CartService::new(store.clone());
        let user_id = UserId::new();
        let product = seed_product(&store, 500, 10).await;

        let cart = service
            .add_item(&FixedGuard::user(user_id), user_id, product.id, 2)
            .await
            .unwrap();

        assert_eq!(cart.user_id, user_id);
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.total.cents(), 1000);
    }

    #[tokio::test]
    async fn repeat_add_merges_line_and_recomputes_total() {
        let store = InMemoryStore::new();
        let service = CartService::new(store.clone());
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);
        let product = seed_product(&store, 500, 10).await;

        service
            .add_item(&guard, user_id, product.id, 2)
            .await
            .unwrap();
        let cart = service
            .add_item(&guard, user_id, product.id, 3)
            .await
            .unwrap();

        let item = cart.item_for(product.id).unwrap();
        assert_eq!(item.quantity, 5);
        assert_eq!(item.total_price().cents(), 2500);
        assert_eq!(cart.total.cents(), 2500);
    }

    #[tokio::test]
    async fn add_item_rejects_zero_quantity_and_missing_product() {
        let store = InMemoryStore::new();
        let service = CartService::new(store.clone());
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);
        let product = seed_product(&store, 500, 10).await;

        let err = service
            .add_item(&guard, user_id, product.id, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::BadRequest(_)));

        let err = service
            .add_item(&guard, user_id, ProductId::new(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::NotFound(_)));
    }

    #[tokio::test]
    async fn add_item_rejects_quantity_overflow() {
        let store = InMemoryStore::new();
        let service = CartService::new(store.clone());
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);
        let product = seed_product(&store, 1, 10).await;

        service
            .add_item(&guard, user_id, product.id, u32::MAX)
            .await
            .unwrap();

        // One more unit would overflow the merged line.
        let err = service
            .add_item(&guard, user_id, product.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::BadRequest(_)));

        let cart = service.get_cart_for_user(&guard, user_id).await.unwrap();
        assert_eq!(cart.quantity_of(product.id), u32::MAX);
    }

    #[tokio::test]
    async fn inventory_policy_counts_existing_line() {
        let store = InMemoryStore::new();
        let service = CartService::with_policy(
            store.clone(),
            CartPolicy {
                enforce_inventory: true,
            },
        );
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);
        let product = seed_product(&store, 500, 5).await;

        service
            .add_item(&guard, user_id, product.id, 4)
            .await
            .unwrap();

        // 4 already promised; 2 more would exceed the 5 in stock.
        let err = service
            .add_item(&guard, user_id, product.id, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::BadRequest(_)));

        let cart = service.get_cart_for_user(&guard, user_id).await.unwrap();
        assert_eq!(cart.quantity_of(product.id), 4);
    }

    #[tokio::test]
    async fn remove_missing_item_is_not_found_and_total_unchanged() {
        let store = InMemoryStore::new();
        let service = CartService::new(store.clone());
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);
        let product = seed_product(&store, 500, 10).await;

        let cart = service
            .add_item(&guard, user_id, product.id, 2)
            .await
            .unwrap();

        let err = service
            .remove_item(&guard, cart.id, ProductId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::NotFound(_)));

        let cart = service.get_cart(&guard, cart.id).await.unwrap();
        assert_eq!(cart.total.cents(), 1000);
    }

    #[tokio::test]
    async fn update_quantity_recomputes_total() {
        let store = InMemoryStore::new();
        let service = CartService::new(store.clone());
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);
        let product = seed_product(&store, 500, 10).await;

        let cart = service
            .add_item(&guard, user_id, product.id, 2)
            .await
            .unwrap();
        let cart = service
            .update_item_quantity(&guard, cart.id, product.id, 5)
            .await
            .unwrap();

        assert_eq!(cart.total.cents(), 2500);
    }

    #[tokio::test]
    async fn clear_cart_empties_and_zeroes() {
        let store = InMemoryStore::new();
        let service = CartService::new(store.clone());
        let user_id = UserId::new();
        let guard = FixedGuard::user(user_id);
        let product = seed_product(&store, 500, 10).await;

        let cart = service
            .add_item(&guard, user_id, product.id, 2)
            .await
            .unwrap();
        service.clear_cart(&guard, cart.id).await.unwrap();

        let cart = service.get_cart(&guard, cart.id).await.unwrap();
        assert!(cart.is_empty());
        assert!(cart.total.is_zero());
    }

    #[tokio::test]
    async fn access_is_guarded() {
        let store = InMemoryStore::new();
        let service = CartService::new(store.clone());
        let user_id = UserId::new();
        let product = seed_product(&store, 500, 10).await;

        let cart = service
            .add_item(&FixedGuard::user(user_id), user_id, product.id, 2)
            .await
            .unwrap();

        // Anonymous caller.
        let err = service
            .get_cart(&FixedGuard::anonymous(), cart.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Unauthorized));

        // A different user.
        let err = service
            .get_cart(&FixedGuard::user(UserId::new()), cart.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CommerceError::Forbidden));

        // An admin may read any cart.
        let cart = service
            .get_cart(&FixedGuard::admin(UserId::new()), cart.id)
            .await
            .unwrap();
        assert_eq!(cart.user_id, user_id);
    }
}
