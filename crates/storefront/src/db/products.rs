//! Product repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use furnish_core::{CategoryId, Money, ProductId};

use super::RepositoryError;
use crate::models::product::{Product, ProductFilter};

/// Upper bound on any single listing query.
pub const MAX_LIMIT: u32 = 100;

const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.name, p.description, p.price, p.category_id,
           c.name AS category_name, p.style, p.material, p.color,
           p.dimensions, p.image_url, p.stock_quantity, p.is_active, p.created_at
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
";

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: Option<String>,
    price: Money,
    category_id: Option<i32>,
    category_name: Option<String>,
    style: Option<String>,
    material: Option<String>,
    color: Option<String>,
    dimensions: Option<String>,
    image_url: Option<String>,
    stock_quantity: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let stock_quantity = u32::try_from(row.stock_quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "negative stock {} for product {}",
                row.stock_quantity, row.id
            ))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            category_id: row.category_id.map(CategoryId::new),
            category_name: row.category_name,
            style: row.style,
            material: row.material,
            color: row.color,
            dimensions: row.dimensions,
            image_url: row.image_url,
            stock_quantity,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

/// Fields for inserting a catalog product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category_id: CategoryId,
    pub style: String,
    pub material: String,
    pub color: String,
    pub dimensions: String,
    pub image_url: Option<String>,
    pub stock_quantity: u32,
}

/// Stock and price of a product locked for an order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LockedStock {
    pub id: i32,
    pub name: String,
    pub price: Money,
    pub stock_quantity: i32,
    pub is_active: bool,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products matching `filter`, newest first.
    ///
    /// `limit` rows are returned starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(PRODUCT_SELECT);
        qb.push(" WHERE p.is_active = TRUE");

        if let Some(category) = filter.category() {
            qb.push(" AND p.category_id = ").push_bind(category.as_i32());
        }
        if let Some(style) = filter.style() {
            qb.push(" AND p.style = ").push_bind(style.to_owned());
        }
        if let Some(min) = filter.min_price() {
            qb.push(" AND p.price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price() {
            qb.push(" AND p.price <= ").push_bind(max);
        }
        if let Some(term) = filter.search_term() {
            let pattern = format!("%{}%", escape_like(term));
            qb.push(" AND (p.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(i64::from(limit.min(MAX_LIMIT)))
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

        let rows = qb
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get an active product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE p.id = $1 AND p.is_active = TRUE"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Get several active products, skipping IDs that are missing or inactive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE p.id = ANY($1) AND p.is_active = TRUE ORDER BY p.id"
        ))
        .bind(&raw)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Newest active products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: u32) -> Result<Vec<Product>, RepositoryError> {
        self.list(&ProductFilter::default(), limit, 0).await
    }

    /// Distinct styles of active products, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn styles(&self) -> Result<Vec<String>, RepositoryError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r"
            SELECT DISTINCT style FROM products
            WHERE style IS NOT NULL AND is_active = TRUE
            ORDER BY style
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(s,)| s).collect())
    }

    /// Insert a product, or refresh the one with the same name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn upsert(&self, product: &NewProduct) -> Result<ProductId, RepositoryError> {
        let stock = i32::try_from(product.stock_quantity).map_err(|_| {
            RepositoryError::Conflict(format!("stock too large for {}", product.name))
        })?;

        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO products
                (name, description, price, category_id, style, material, color,
                 dimensions, image_url, stock_quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (name) DO UPDATE SET
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                category_id = EXCLUDED.category_id,
                style = EXCLUDED.style,
                material = EXCLUDED.material,
                color = EXCLUDED.color,
                dimensions = EXCLUDED.dimensions,
                image_url = EXCLUDED.image_url,
                stock_quantity = EXCLUDED.stock_quantity,
                is_active = TRUE
            RETURNING id
            ",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.category_id.as_i32())
        .bind(&product.style)
        .bind(&product.material)
        .bind(&product.color)
        .bind(&product.dimensions)
        .bind(&product.image_url)
        .bind(stock)
        .fetch_one(self.pool)
        .await?;

        Ok(ProductId::new(id))
    }
}

/// Lock product rows for the duration of a checkout transaction.
///
/// Rows are locked in ID order so concurrent checkouts cannot deadlock.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_stock(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[ProductId],
) -> Result<Vec<LockedStock>, RepositoryError> {
    let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
    let rows = sqlx::query_as::<_, LockedStock>(
        r"
        SELECT id, name, price, stock_quantity, is_active
        FROM products
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        ",
    )
    .bind(&raw)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows)
}

/// Take `quantity` units out of stock inside a checkout transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn decrement_stock(
    tx: &mut Transaction<'_, Postgres>,
    id: ProductId,
    quantity: u32,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE products SET stock_quantity = stock_quantity - $2 WHERE id = $1")
        .bind(id.as_i32())
        .bind(i32::try_from(quantity).unwrap_or(i32::MAX))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Escape `%`, `_` and `\` so user text matches literally inside `ILIKE`.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("oak table"), "oak table");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }
}
