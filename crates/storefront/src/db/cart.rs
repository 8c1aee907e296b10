//! Cart repository for signed-in shoppers.
//!
//! Only `(user_id, product_id, quantity)` is stored; name, price and stock
//! are joined from `products` on every read so the cart never shows stale
//! prices.

use sqlx::{PgPool, Postgres, Transaction};

use furnish_core::cart::CartItem;
use furnish_core::{Money, ProductId, UserId};

use super::RepositoryError;

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    product_id: i32,
    name: String,
    price: Money,
    quantity: i32,
    stock_quantity: i32,
    image_url: Option<String>,
    style: Option<String>,
    material: Option<String>,
}

impl TryFrom<CartRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str| {
            RepositoryError::DataCorruption(format!(
                "negative {what} in cart for product {}",
                row.product_id
            ))
        };
        Ok(Self {
            product_id: ProductId::new(row.product_id),
            quantity: u32::try_from(row.quantity).map_err(|_| corrupt("quantity"))?,
            stock_quantity: u32::try_from(row.stock_quantity).map_err(|_| corrupt("stock"))?,
            name: row.name,
            price: row.price,
            image_url: row.image_url,
            style: row.style,
            material: row.material,
        })
    }
}

/// A stored cart line without product details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Repository for persisted cart lines.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's cart lines for active products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartRow>(
            r"
            SELECT c.product_id, p.name, p.price, c.quantity, p.stock_quantity,
                   p.image_url, p.style, p.material
            FROM cart c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1 AND p.is_active = TRUE
            ORDER BY c.created_at, c.product_id
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CartItem::try_from).collect()
    }

    /// Store the quantity for one line, inserting it if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO cart (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = NOW()
            ",
        )
        .bind(user_id.as_i32())
        .bind(product_id.as_i32())
        .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Delete one line. Returns whether a line existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart WHERE user_id = $1 AND product_id = $2")
            .bind(user_id.as_i32())
            .bind(product_id.as_i32())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every line of a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart WHERE user_id = $1")
            .bind(user_id.as_i32())
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

/// Read the cart inside a checkout transaction, locking its rows.
///
/// Unlike [`CartRepository::items`] this includes lines for inactive
/// products; the caller decides what to do with them.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lines_for_update(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<Vec<CartLine>, RepositoryError> {
    let rows: Vec<(i32, i32)> = sqlx::query_as(
        r"
        SELECT product_id, quantity FROM cart
        WHERE user_id = $1
        ORDER BY product_id
        FOR UPDATE
        ",
    )
    .bind(user_id.as_i32())
    .fetch_all(&mut **tx)
    .await?;

    rows.into_iter()
        .map(|(product_id, quantity)| {
            let quantity = u32::try_from(quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!(
                    "negative quantity in cart for product {product_id}"
                ))
            })?;
            Ok(CartLine {
                product_id: ProductId::new(product_id),
                quantity,
            })
        })
        .collect()
}

/// Empty a cart inside a checkout transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn clear_in(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cart WHERE user_id = $1")
        .bind(user_id.as_i32())
        .execute(&mut **tx)
        .await?;
    Ok(())
}
