//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use furnish_core::pricing::PricingPolicy;

use crate::config::StorefrontConfig;
use crate::services::catalog::{CatalogCache, CatalogService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    catalog_cache: CatalogCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                catalog_cache: CatalogCache::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Shipping and tax rules for every cart view and order.
    #[must_use]
    pub fn pricing(&self) -> PricingPolicy {
        self.inner.config.shop.pricing
    }

    /// Catalog service over the shared cache.
    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(
            &self.inner.pool,
            &self.inner.catalog_cache,
            self.inner.config.shop.page_size,
        )
    }
}
