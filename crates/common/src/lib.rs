//! Shared types for the commerce backend.
//!
//! This crate provides the UUID-backed identifier newtypes, the `Money`
//! value type, and the entity types (`Product`, `Cart`, `Order` and their
//! line items) that both the store and domain layers work with.

pub mod cart;
pub mod catalog;
pub mod money;
pub mod order;
pub mod types;

pub use cart::{Cart, CartItem};
pub use catalog::Product;
pub use money::Money;
pub use order::{Order, OrderItem, OrderStatus};
pub use types::{CartId, OrderId, ProductId, UserId};
