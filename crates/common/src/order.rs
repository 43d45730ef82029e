//! Order aggregate types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{OrderId, ProductId, UserId};

/// Status of an order.
///
/// Only two states are reachable: orders are created `Pending` and the
/// single modelled transition is cancellation, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Cancelled,
}

impl OrderStatus {
    /// Returns the status as a lowercase string (the persisted form).
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parses the persisted form back into a status.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One product line within an order.
///
/// Created once at placement time and never mutated; `price` is the product
/// price at that instant, independent of the cart's earlier snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    /// Product name snapshot for display.
    pub product_name: String,
    pub quantity: u32,
    pub price: Money,
}

impl OrderItem {
    /// Creates a new order line.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        quantity: u32,
        price: Money,
    ) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            price,
        }
    }

    /// Returns the line total (`price × quantity`).
    pub fn total_price(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// An order created from a cart at purchase time.
///
/// Immutable except for `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_date: NaiveDate,
    pub status: OrderStatus,
    pub total: Money,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Creates a pending order dated `order_date` from prepared lines.
    pub fn new(user_id: UserId, order_date: NaiveDate, items: Vec<OrderItem>) -> Self {
        let total = items.iter().map(OrderItem::total_price).sum();
        Self {
            id: OrderId::new(),
            user_id,
            order_date,
            status: OrderStatus::Pending,
            total,
            items,
        }
    }

    /// Returns true if the order has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status == OrderStatus::Cancelled
    }

    /// Days elapsed between the order date and `today`.
    pub fn days_since_order(&self, today: NaiveDate) -> i64 {
        (today - self.order_date).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_order_totals_lines_and_starts_pending() {
        let items = vec![
            OrderItem::new(ProductId::new(), "Widget", 2, Money::from_cents(1000)),
            OrderItem::new(ProductId::new(), "Gadget", 1, Money::from_cents(500)),
        ];
        let order = Order::new(UserId::new(), date(2026, 8, 27), items);

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total.cents(), 2500);
        assert!(!order.is_cancelled());
    }

    #[test]
    fn days_since_order() {
        let order = Order::new(UserId::new(), date(2026, 8, 23), vec![]);
        assert_eq!(order.days_since_order(date(2026, 8, 27)), 4);
        assert_eq!(order.days_since_order(date(2026, 8, 23)), 0);
    }

    #[test]
    fn status_persisted_form_roundtrip() {
        for status in [OrderStatus::Pending, OrderStatus::Cancelled] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("shipped"), None);
    }
}
