//! Catalog management service.
//!
//! Reads are public; writes are admin-gated. This is the "catalog admin
//! edits" path through which inventory may change outside the order
//! lifecycle.

use common::{Money, Product, ProductId};
use store::{ProductFilter, ProductStore};

use crate::access::{AccessGuard, require_admin};
use crate::error::CommerceError;

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub brand: String,
    pub description: String,
    pub category: String,
    pub price: Money,
    pub inventory: u32,
}

/// Partial update of a product; None fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Money>,
    pub inventory: Option<u32>,
}

/// Service for product catalog management.
pub struct CatalogService<S> {
    store: S,
}

impl<S: ProductStore> CatalogService<S> {
    /// Creates a new catalog service.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads a product by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, product_id: ProductId) -> Result<Product, CommerceError> {
        self.store
            .find_product(product_id)
            .await?
            .ok_or_else(|| CommerceError::NotFound("Product not found".into()))
    }

    /// Lists the catalog, narrowed by category, brand, or a name fragment.
    /// The default filter lists everything.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, CommerceError> {
        Ok(self.store.list_products(filter).await?)
    }

    /// Adds a product. Admin only.
    #[tracing::instrument(skip(self, guard, new))]
    pub async fn add_product(
        &self,
        guard: &dyn AccessGuard,
        new: NewProduct,
    ) -> Result<Product, CommerceError> {
        require_admin(guard)?;
        let product = Product::new(
            new.name,
            new.brand,
            new.description,
            new.category,
            new.price,
            new.inventory,
        );
        Ok(self.store.save_product(product).await?)
    }

    /// Applies a partial update to a product. Admin only.
    #[tracing::instrument(skip(self, guard, update))]
    pub async fn update_product(
        &self,
        guard: &dyn AccessGuard,
        product_id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, CommerceError> {
        require_admin(guard)?;
        let mut product = self.get_product(product_id).await?;

        if let Some(name) = update.name {
            product.name = name;
        }
        if let Some(brand) = update.brand {
            product.brand = brand;
        }
        if let Some(description) = update.description {
            product.description = description;
        }
        if let Some(category) = update.category {
            product.category = category;
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(inventory) = update.inventory {
            product.inventory = inventory;
        }

        Ok(self.store.save_product(product).await?)
    }

    /// Deletes a product. Admin only.
    #[tracing::instrument(skip(self, guard))]
    pub async fn delete_product(
        &self,
        guard: &dyn AccessGuard,
        product_id: ProductId,
    ) -> Result<(), CommerceError> {
        require_admin(guard)?;
        if !self.store.delete_product(product_id).await? {
            return Err(CommerceError::NotFound("Product not found".into()));
        }
        Ok(())
    }
}
