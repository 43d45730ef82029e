use common::{OrderId, ProductId};
use thiserror::Error;

/// Errors that can occur when interacting with a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A guarded inventory decrement found fewer units than requested.
    ///
    /// Raised inside `commit_placement` when the check-and-decrement on a
    /// product row fails, which is the backstop against concurrent
    /// placements racing the same stock.
    #[error("insufficient inventory for product {product_id}")]
    InsufficientInventory { product_id: ProductId },

    /// The guarded status flip in `commit_cancellation` found the order
    /// already cancelled, meaning a racing cancel committed first.
    #[error("order already cancelled: {order_id}")]
    AlreadyCancelled { order_id: OrderId },

    /// A row referenced by a write was missing.
    #[error("{entity} not found in store: {id}")]
    MissingRow { entity: &'static str, id: String },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A persisted value could not be interpreted.
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
