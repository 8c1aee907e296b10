//! Order repository for database operations.
//!
//! Inserts happen inside the checkout transaction owned by
//! `services::checkout`; reads back the account pages.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use furnish_core::checkout::ShippingDetails;
use furnish_core::pricing::OrderTotals;
use furnish_core::{Money, OrderId, OrderItemId, PaymentMethod, ProductId, UserId};

use super::RepositoryError;
use crate::models::order::{Order, OrderItem, OrderSummary};

/// Orders shown in the account history.
pub const HISTORY_LIMIT: i64 = 10;

/// Fields for inserting an order header.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub order_number: &'a str,
    pub user_id: UserId,
    pub totals: &'a OrderTotals,
    pub shipping_address: &'a ShippingDetails,
    pub billing_address: &'a ShippingDetails,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    user_id: i32,
    subtotal: Money,
    discount: Money,
    shipping_cost: Money,
    tax_amount: Money,
    total_amount: Money,
    status: String,
    shipping_address: Json<ShippingDetails>,
    billing_address: Json<ShippingDetails>,
    payment_method: String,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let status = self.status.parse().map_err(|_| {
            RepositoryError::DataCorruption(format!("unknown order status {}", self.status))
        })?;
        let payment_method = self.payment_method.parse().map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "unknown payment method {}",
                self.payment_method
            ))
        })?;

        Ok(Order {
            id: OrderId::new(self.id),
            order_number: self.order_number,
            user_id: UserId::new(self.user_id),
            totals: OrderTotals {
                subtotal: self.subtotal,
                discount: self.discount,
                shipping: self.shipping_cost,
                tax: self.tax_amount,
                total: self.total_amount,
            },
            status,
            shipping_address: self.shipping_address.0,
            billing_address: self.billing_address.0,
            payment_method,
            created_at: self.created_at,
            items,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    product_id: i32,
    product_name: String,
    image_url: Option<String>,
    quantity: i32,
    price: Money,
    subtotal: Money,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            image_url: row.image_url,
            quantity: u32::try_from(row.quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!("negative quantity on item {}", row.id))
            })?,
            price: row.price,
            subtotal: row.subtotal,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    id: i32,
    order_number: String,
    total_amount: Money,
    status: String,
    item_count: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderSummaryRow> for OrderSummary {
    type Error = RepositoryError;

    fn try_from(row: OrderSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderId::new(row.id),
            status: row.status.parse().map_err(|_| {
                RepositoryError::DataCorruption(format!("unknown order status {}", row.status))
            })?,
            order_number: row.order_number,
            total: row.total_amount,
            item_count: u32::try_from(row.item_count).unwrap_or(u32::MAX),
            created_at: row.created_at,
        })
    }
}

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's most recent orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            r"
            SELECT o.id, o.order_number, o.total_amount, o.status, o.created_at,
                   (SELECT COUNT(*) FROM order_items oi WHERE oi.order_id = o.id) AS item_count
            FROM orders o
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $2
            ",
        )
        .bind(user_id.as_i32())
        .bind(HISTORY_LIMIT)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderSummary::try_from).collect()
    }

    /// One of the user's orders with its lines. Other users' orders are `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, order_number, user_id, subtotal, discount, shipping_cost, tax_amount,
                   total_amount, status, shipping_address, billing_address, payment_method,
                   created_at
            FROM orders
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(order_id.as_i32())
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT oi.id, oi.product_id, p.name AS product_name, p.image_url,
                   oi.quantity, oi.price, oi.subtotal
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            ",
        )
        .bind(order_id.as_i32())
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(OrderItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        row.into_order(items).map(Some)
    }
}

/// Insert an order header inside the checkout transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the order number is already used.
pub async fn insert_order(
    tx: &mut Transaction<'_, Postgres>,
    order: &NewOrder<'_>,
) -> Result<OrderId, RepositoryError> {
    let (id,): (i32,) = sqlx::query_as(
        r"
        INSERT INTO orders (
            user_id, order_number, subtotal, discount, shipping_cost, tax_amount,
            total_amount, status, shipping_address, billing_address, payment_method, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $9, $10, $11)
        RETURNING id
        ",
    )
    .bind(order.user_id.as_i32())
    .bind(order.order_number)
    .bind(order.totals.subtotal)
    .bind(order.totals.discount)
    .bind(order.totals.shipping)
    .bind(order.totals.tax)
    .bind(order.totals.total)
    .bind(Json(order.shipping_address))
    .bind(Json(order.billing_address))
    .bind(order.payment_method.code())
    .bind(order.created_at)
    .fetch_one(&mut **tx)
    .await
    .map_err(RepositoryError::from_unique)?;

    Ok(OrderId::new(id))
}

/// Insert one order line inside the checkout transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert_item(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    product_id: ProductId,
    quantity: u32,
    price: Money,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO order_items (order_id, product_id, quantity, price, subtotal)
        VALUES ($1, $2, $3, $4, $5)
        ",
    )
    .bind(order_id.as_i32())
    .bind(product_id.as_i32())
    .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
    .bind(price)
    .bind(price.times(quantity))
    .execute(&mut **tx)
    .await?;
    Ok(())
}
