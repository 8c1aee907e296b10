//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use furnish_core::checkout::ShippingDetails;
use furnish_core::pricing::OrderTotals;
use furnish_core::{Money, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, UserId};

/// A placed order with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-facing reference, `ORD-{unix_seconds}-{user_id}`.
    pub order_number: String,
    pub user_id: UserId,
    pub totals: OrderTotals,
    pub status: OrderStatus,
    pub shipping_address: ShippingDetails,
    pub billing_address: ShippingDetails,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// One line of a placed order. `price` is the unit price at purchase time.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub price: Money,
    pub subtotal: Money,
}

/// An order as listed in the account history.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub order_number: String,
    pub total: Money,
    pub status: OrderStatus,
    pub item_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub order_number: String,
    pub totals: OrderTotals,
    pub new_balance: Money,
}

/// Build the order reference shown to shoppers.
#[must_use]
pub fn order_number(placed_at: DateTime<Utc>, user_id: UserId) -> String {
    format!("ORD-{}-{}", placed_at.timestamp(), user_id)
}
