//! Domain error types.

use store::StoreError;
use thiserror::Error;

/// Errors that can occur during domain operations.
///
/// The first four variants are domain errors and propagate to the caller
/// unchanged; `Store` covers unexpected persistence failures and maps to an
/// internal error at the HTTP boundary.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// A referenced cart, order, product, or line is missing.
    #[error("{0}")]
    NotFound(String),

    /// The request is well-formed but violates a business rule.
    #[error("{0}")]
    BadRequest(String),

    /// No authenticated principal.
    #[error("authentication required")]
    Unauthorized,

    /// The principal is neither the resource owner nor an admin.
    #[error("access denied")]
    Forbidden,

    /// An unexpected error occurred in the store.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for CommerceError {
    fn from(e: StoreError) -> Self {
        match e {
            // A concurrent placement won the race for the last units; this
            // is a user-fixable stock condition, not an internal failure.
            StoreError::InsufficientInventory { product_id } => CommerceError::BadRequest(
                format!("Inventory is not enough for product: {product_id}"),
            ),
            // A concurrent cancellation committed first; same answer the
            // service pre-check gives.
            StoreError::AlreadyCancelled { .. } => {
                CommerceError::BadRequest("Order already cancelled".into())
            }
            other => CommerceError::Store(other),
        }
    }
}
