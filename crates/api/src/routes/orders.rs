//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{Order, OrderId, OrderItem, UserId};
use serde::Serialize;
use store::CommerceStore;
use uuid::Uuid;

use crate::auth::RequestGuard;
use crate::error::ApiError;
use crate::routes::{AppState, success};

// -- Response types --

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub price_cents: i64,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.as_uuid(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            price_cents: item.price.cents(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_date: chrono::NaiveDate,
    pub status: String,
    pub total_cents: i64,
    pub items: Vec<OrderItemResponse>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.as_uuid(),
            user_id: order.user_id.as_uuid(),
            order_date: order.order_date,
            status: order.status.to_string(),
            total_cents: order.total.cents(),
            items: order.items.iter().map(OrderItemResponse::from).collect(),
        }
    }
}

// -- Handlers --

/// POST /users/{user_id}/orders — place an order from the user's cart.
#[tracing::instrument(skip(state, guard))]
pub async fn place<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<Uuid>,
    guard: RequestGuard,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let order = state
        .orders
        .place_order(&guard, UserId::from_uuid(user_id))
        .await?;
    Ok((
        StatusCode::CREATED,
        success("Order placed", OrderResponse::from(&order)),
    ))
}

/// GET /users/{user_id}/orders — the user's order history.
#[tracing::instrument(skip(state, guard))]
pub async fn list_for_user<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(user_id): Path<Uuid>,
    guard: RequestGuard,
) -> Result<Json<serde_json::Value>, ApiError> {
    let orders = state
        .orders
        .get_orders_for_user(&guard, UserId::from_uuid(user_id))
        .await?;
    let responses: Vec<OrderResponse> = orders.iter().map(OrderResponse::from).collect();
    Ok(success("Orders found", responses))
}

/// GET /orders/{id} — an order by id.
#[tracing::instrument(skip(state, guard))]
pub async fn get<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<Uuid>,
    guard: RequestGuard,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order = state
        .orders
        .get_order(&guard, OrderId::from_uuid(order_id))
        .await?;
    Ok(success("Order found", OrderResponse::from(&order)))
}

/// POST /orders/{id}/cancel — cancel an order within the policy window.
#[tracing::instrument(skip(state, guard))]
pub async fn cancel<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<Uuid>,
    guard: RequestGuard,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order = state
        .orders
        .cancel_order(&guard, OrderId::from_uuid(order_id))
        .await?;
    Ok(success("Order cancelled", OrderResponse::from(&order)))
}
