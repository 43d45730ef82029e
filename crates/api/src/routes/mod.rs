//! HTTP route handlers.

pub mod carts;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use axum::Json;
use domain::{CartService, CatalogService, OrderService};
use serde::Serialize;

/// Shared application state accessible from all handlers.
pub struct AppState<S> {
    pub carts: CartService<S>,
    pub orders: OrderService<S>,
    pub catalog: CatalogService<S>,
}

/// Success envelope: `{error: null, message, data}`, the mirror image of the
/// failure body produced by [`crate::error::ApiError`].
pub(crate) fn success(message: &str, data: impl Serialize) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "error": null,
        "message": message,
        "data": data,
    }))
}
