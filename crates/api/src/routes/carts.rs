//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{Cart, CartId, CartItem, ProductId, UserId};
use serde::{Deserialize, Serialize};
use store::CommerceStore;
use uuid::Uuid;

use crate::auth::RequestGuard;
use crate::error::ApiError;
use crate::routes::{AppState, success};

// -- Request types --

#[derive(Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product_id: Uuid,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

impl From<&CartItem> for CartItemResponse {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.as_uuid(),
            quantity: item.quantity,
            unit_price_cents: item.unit_price.cents(),
            total_price_cents: item.total_price().cents(),
        }
    }
}

#[derive(Serialize)]
pub struct CartResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_cents: i64,
    pub items: Vec<CartItemResponse>,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id.as_uuid(),
            user_id: cart.user_id.as_uuid(),
            total_cents: cart.total.cents(),
            items: cart.items.iter().map(CartItemResponse::from).collect(),
        }
    }
}

// -- Handlers --

/// POST /users/{user_id}/cart/items — add a product to the user's cart.
#[tracing::instrument(skip(state, guard, req))]
pub async fn add_item<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<Uuid>,
    guard: RequestGuard,
    Json(req): Json<AddCartItemRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cart = state
        .carts
        .add_item(
            &guard,
            UserId::from_uuid(user_id),
            ProductId::from_uuid(req.product_id),
            req.quantity,
        )
        .await?;
    Ok(success("Item added to cart", CartResponse::from(&cart)))
}

/// GET /users/{user_id}/cart — the user's cart.
#[tracing::instrument(skip(state, guard))]
pub async fn get_for_user<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<Uuid>,
    guard: RequestGuard,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cart = state
        .carts
        .get_cart_for_user(&guard, UserId::from_uuid(user_id))
        .await?;
    Ok(success("Cart found", CartResponse::from(&cart)))
}

/// GET /carts/{id} — a cart by id.
#[tracing::instrument(skip(state, guard))]
pub async fn get<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(cart_id): Path<Uuid>,
    guard: RequestGuard,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cart = state
        .carts
        .get_cart(&guard, CartId::from_uuid(cart_id))
        .await?;
    Ok(success("Cart found", CartResponse::from(&cart)))
}

/// PUT /carts/{id}/items/{product_id} — set a line's quantity.
#[tracing::instrument(skip(state, guard, req))]
pub async fn update_item<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((cart_id, product_id)): Path<(Uuid, Uuid)>,
    guard: RequestGuard,
    Json(req): Json<UpdateCartItemRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cart = state
        .carts
        .update_item_quantity(
            &guard,
            CartId::from_uuid(cart_id),
            ProductId::from_uuid(product_id),
            req.quantity,
        )
        .await?;
    Ok(success("Cart item updated", CartResponse::from(&cart)))
}

/// DELETE /carts/{id}/items/{product_id} — remove a line.
#[tracing::instrument(skip(state, guard))]
pub async fn remove_item<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((cart_id, product_id)): Path<(Uuid, Uuid)>,
    guard: RequestGuard,
) -> Result<Json<serde_json::Value>, ApiError> {
    let cart = state
        .carts
        .remove_item(
            &guard,
            CartId::from_uuid(cart_id),
            ProductId::from_uuid(product_id),
        )
        .await?;
    Ok(success("Cart item removed", CartResponse::from(&cart)))
}

/// DELETE /carts/{id}/items — clear the cart.
#[tracing::instrument(skip(state, guard))]
pub async fn clear<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(cart_id): Path<Uuid>,
    guard: RequestGuard,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .carts
        .clear_cart(&guard, CartId::from_uuid(cart_id))
        .await?;
    Ok(success("Cart cleared", serde_json::Value::Null))
}
