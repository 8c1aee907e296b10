//! Public catalog API. No authentication.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::{Value, json};

use furnish_core::ProductId;

use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::models::product::ProductFilter;
use crate::state::AppState;

/// Filtered, paginated product list.
///
/// GET /api/products?category_id=&style=&min_price=&max_price=&search=&limit=&page=
///
/// # Errors
///
/// 500 if the catalog query fails.
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Value>> {
    let page = state.catalog().page(&filter).await?;
    Ok(Json(json!({
        "products": page.products,
        "page": page.page,
        "has_more": page.has_more,
    })))
}

/// One product.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// 404 when missing or inactive.
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Value>> {
    match state.catalog().product(ProductId::new(id)).await {
        Ok(product) => Ok(Json(json!({ "product": product }))),
        Err(RepositoryError::NotFound) => Err(AppError::NotFound("Product not found".to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Newest products.
///
/// GET /api/products/featured
///
/// # Errors
///
/// 500 if the query fails.
pub async fn featured(State(state): State<AppState>) -> Result<Json<Value>> {
    let products = state.catalog().featured().await?;
    Ok(Json(json!({ "products": products })))
}

/// All categories.
///
/// GET /api/categories
///
/// # Errors
///
/// 500 if the query fails.
pub async fn categories(State(state): State<AppState>) -> Result<Json<Value>> {
    let categories = state.catalog().categories().await?;
    Ok(Json(json!({ "categories": categories })))
}

/// Distinct styles of active products.
///
/// GET /api/styles
///
/// # Errors
///
/// 500 if the query fails.
pub async fn styles(State(state): State<AppState>) -> Result<Json<Value>> {
    let styles = state.catalog().styles().await?;
    Ok(Json(json!({ "styles": styles })))
}
