//! Domain layer for the commerce backend.
//!
//! This crate provides the core business services:
//! - `CartService` for the cart aggregate (lines, totals, policy checks)
//! - `OrderService` for the cart-to-order lifecycle (placement, cancellation)
//! - `CatalogService` for admin-gated product management
//! - `AccessGuard` as the single "who is calling, and are they allowed"
//!   abstraction the services depend on

pub mod access;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod order;

pub use access::{AccessGuard, FixedGuard, Principal};
pub use cart::{CartPolicy, CartService};
pub use catalog::{CatalogService, NewProduct, ProductUpdate};
pub use error::CommerceError;
pub use order::{OrderPolicy, OrderService};
