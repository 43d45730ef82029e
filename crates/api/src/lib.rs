//! HTTP API server for the commerce backend.
//!
//! Provides REST endpoints for the catalog, carts, and the order lifecycle,
//! with structured logging (tracing) and Prometheus metrics. Handlers are
//! generic over the store backend so the same router serves the in-memory
//! and PostgreSQL stores.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use domain::{CartPolicy, CartService, CatalogService, OrderPolicy, OrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::CommerceStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::AppState;

/// Creates the shared application state from a store and configuration.
pub fn create_state<S: CommerceStore + Clone>(store: S, config: &Config) -> Arc<AppState<S>> {
    Arc::new(AppState {
        carts: CartService::with_policy(
            store.clone(),
            CartPolicy {
                enforce_inventory: config.enforce_cart_inventory,
            },
        ),
        orders: OrderService::with_policy(
            store.clone(),
            OrderPolicy {
                max_cancel_days: config.max_cancel_days,
            },
        ),
        catalog: CatalogService::new(store),
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: CommerceStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/products",
            get(routes::products::list::<S>).post(routes::products::create::<S>),
        )
        .route(
            "/products/{id}",
            get(routes::products::get::<S>)
                .put(routes::products::update::<S>)
                .delete(routes::products::delete::<S>),
        )
        .route("/users/{user_id}/cart", get(routes::carts::get_for_user::<S>))
        .route(
            "/users/{user_id}/cart/items",
            post(routes::carts::add_item::<S>),
        )
        .route("/carts/{id}", get(routes::carts::get::<S>))
        .route("/carts/{id}/items", delete(routes::carts::clear::<S>))
        .route(
            "/carts/{id}/items/{product_id}",
            put(routes::carts::update_item::<S>).delete(routes::carts::remove_item::<S>),
        )
        .route(
            "/users/{user_id}/orders",
            post(routes::orders::place::<S>).get(routes::orders::list_for_user::<S>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
