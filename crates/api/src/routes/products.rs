//! Catalog endpoints. Reads are public; writes require an admin principal.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{Money, Product, ProductId};
use domain::{NewProduct, ProductUpdate};
use serde::{Deserialize, Serialize};
use store::{CommerceStore, ProductFilter};
use uuid::Uuid;

use crate::auth::RequestGuard;
use crate::error::ApiError;
use crate::routes::{AppState, success};

// -- Request types --

#[derive(Deserialize)]
pub struct AddProductRequest {
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price_cents: i64,
    pub inventory: u32,
}

#[derive(Deserialize, Default)]
pub struct ListProductsQuery {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub name: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub inventory: Option<u32>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub description: String,
    pub category: String,
    pub price_cents: i64,
    pub inventory: u32,
}

impl From<&Product> for ProductResponse {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_uuid(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            price_cents: product.price.cents(),
            inventory: product.inventory,
        }
    }
}

// -- Handlers --

/// GET /products — the catalog, optionally narrowed by `category`, `brand`,
/// and `name` query parameters.
#[tracing::instrument(skip(state, query))]
pub async fn list<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let filter = ProductFilter {
        category: query.category,
        brand: query.brand,
        name: query.name,
    };
    let products = state.catalog.list_products(&filter).await?;
    let responses: Vec<ProductResponse> = products.iter().map(ProductResponse::from).collect();
    Ok(success("Products found", responses))
}

/// GET /products/{id} — a product by id.
#[tracing::instrument(skip(state))]
pub async fn get<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let product = state
        .catalog
        .get_product(ProductId::from_uuid(product_id))
        .await?;
    Ok(success("Product found", ProductResponse::from(&product)))
}

/// POST /products — add a product (admin).
#[tracing::instrument(skip(state, guard, req))]
pub async fn create<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    guard: RequestGuard,
    Json(req): Json<AddProductRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let product = state
        .catalog
        .add_product(
            &guard,
            NewProduct {
                name: req.name,
                brand: req.brand,
                description: req.description,
                category: req.category,
                price: Money::from_cents(req.price_cents),
                inventory: req.inventory,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        success("Product added", ProductResponse::from(&product)),
    ))
}

/// PUT /products/{id} — partially update a product (admin).
#[tracing::instrument(skip(state, guard, req))]
pub async fn update<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<Uuid>,
    guard: RequestGuard,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let product = state
        .catalog
        .update_product(
            &guard,
            ProductId::from_uuid(product_id),
            ProductUpdate {
                name: req.name,
                brand: req.brand,
                description: req.description,
                category: req.category,
                price: req.price_cents.map(Money::from_cents),
                inventory: req.inventory,
            },
        )
        .await?;
    Ok(success("Product updated", ProductResponse::from(&product)))
}

/// DELETE /products/{id} — delete a product (admin).
#[tracing::instrument(skip(state, guard))]
pub async fn delete<S: CommerceStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(product_id): Path<Uuid>,
    guard: RequestGuard,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .catalog
        .delete_product(&guard, ProductId::from_uuid(product_id))
        .await?;
    Ok(success("Product deleted", serde_json::Value::Null))
}
