//! Persistence layer for the commerce backend.
//!
//! Defines the store traits the domain services depend on and two backends:
//! an in-memory store for tests and local runs, and a PostgreSQL store for
//! production. The multi-row writes of the order lifecycle (`commit_placement`
//! and `commit_cancellation`) are the atomicity boundary: each backend applies
//! the whole write-set or none of it.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{CartStore, CommerceStore, OrderStore, ProductFilter, ProductStore};
