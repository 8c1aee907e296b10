//! Catalog reads with a small in-memory cache.
//!
//! Product listings always hit the database (stock changes on every order).
//! Categories and styles change only when the catalog is re-seeded, so
//! they are cached with `moka` for five minutes.

use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, instrument};

use furnish_core::ProductId;

use crate::db::RepositoryError;
use crate::db::categories::CategoryRepository;
use crate::db::products::{MAX_LIMIT, ProductRepository};
use crate::models::product::{Category, Product, ProductFilter};

/// Products on the home page "featured" strip.
pub const FEATURED_LIMIT: u32 = 8;

const CATEGORIES_KEY: &str = "categories";
const STYLES_KEY: &str = "styles";

/// Cached catalog lookups.
#[derive(Clone, Debug)]
enum CacheValue {
    Categories(Vec<Category>),
    Styles(Vec<String>),
}

/// Shared cache for slow-changing catalog data.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<&'static str, CacheValue>,
}

impl CatalogCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(16)
                .time_to_live(Duration::from_secs(300))
                .build(),
        }
    }

    /// Drop everything, e.g. after seeding.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

/// One page of a product listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub page: u32,
    pub has_more: bool,
}

/// Catalog service.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
    categories: CategoryRepository<'a>,
    cache: &'a CatalogCache,
    page_size: u32,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, cache: &'a CatalogCache, page_size: u32) -> Self {
        Self {
            products: ProductRepository::new(pool),
            categories: CategoryRepository::new(pool),
            cache,
            page_size,
        }
    }

    /// One page of products matching `filter`.
    ///
    /// An explicit `limit` in the filter overrides the page size.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn page(&self, filter: &ProductFilter) -> Result<ProductPage, RepositoryError> {
        let per_page = filter
            .limit
            .unwrap_or(self.page_size)
            .clamp(1, MAX_LIMIT - 1);
        let page = filter.page();
        let offset = u64::from(page - 1) * u64::from(per_page);

        // One extra row tells us whether another page exists.
        let mut products = self.products.list(filter, per_page + 1, offset).await?;
        let has_more = products.len() > per_page as usize;
        products.truncate(per_page as usize);

        Ok(ProductPage {
            products,
            page,
            has_more,
        })
    }

    /// An active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` when missing or inactive.
    pub async fn product(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.products.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Newest products for the home page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self) -> Result<Vec<Product>, RepositoryError> {
        self.products.featured(FEATURED_LIMIT).await
    }

    /// Free-text search used by the room assistant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, term: &str, limit: u32) -> Result<Vec<Product>, RepositoryError> {
        self.products
            .list(&ProductFilter::search(term, limit), limit, 0)
            .await
    }

    /// All categories, cached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on a cache miss that fails.
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) = self.cache.cache.get(CATEGORIES_KEY).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = self.categories.list().await?;
        self.cache
            .cache
            .insert(CATEGORIES_KEY, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// Distinct product styles, cached.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` on a cache miss that fails.
    pub async fn styles(&self) -> Result<Vec<String>, RepositoryError> {
        if let Some(CacheValue::Styles(styles)) = self.cache.cache.get(STYLES_KEY).await {
            debug!("Cache hit for styles");
            return Ok(styles);
        }

        let styles = self.products.styles().await?;
        self.cache
            .cache
            .insert(STYLES_KEY, CacheValue::Styles(styles.clone()))
            .await;
        Ok(styles)
    }
}
