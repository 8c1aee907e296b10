//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use furnish_core::ProductId;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::models::product::{Product, ProductFilter};
use crate::services::catalog::ProductPage;
use crate::state::AppState;

/// Stock at or below this shows a "only N left" note.
const LOW_STOCK: u32 = 5;
/// Products shown under "You may also like".
const RELATED_LIMIT: usize = 4;
/// Fetched for the related strip; one may be the product itself.
const RELATED_FETCH: u32 = 5;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub style: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub dimensions: Option<String>,
    pub stock_quantity: u32,
    pub in_stock: bool,
    pub low_stock: bool,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i32(),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.to_string(),
            image_url: product.image_url.clone(),
            category: product.category_name.clone(),
            style: product.style.clone(),
            material: product.material.clone(),
            color: product.color.clone(),
            dimensions: product.dimensions.clone(),
            stock_quantity: product.stock_quantity,
            in_stock: product.in_stock(),
            low_stock: product.in_stock() && product.stock_quantity <= LOW_STOCK,
        }
    }
}

/// Convert a list of products into views.
pub fn views(products: &[Product]) -> Vec<ProductView> {
    products.iter().map(ProductView::from).collect()
}

/// URL of the page after `page`, if there is one.
pub fn next_page_url(filter: &ProductFilter, page: &ProductPage) -> Option<String> {
    if !page.has_more {
        return None;
    }
    let query = filter.query_string();
    let next = page.page + 1;
    Some(if query.is_empty() {
        format!("/products/more?page={next}")
    } else {
        format!("/products/more?{query}&page={next}")
    })
}

/// One page of product cards plus the infinite-scroll sentinel (HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_page.html")]
pub struct ProductPageTemplate {
    pub products: Vec<ProductView>,
    pub next_page_url: Option<String>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub current_user: Option<CurrentUser>,
    pub product: ProductView,
    pub related_products: Vec<ProductView>,
}

/// Quick view fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/quick_view.html")]
pub struct QuickViewTemplate {
    pub product: ProductView,
}

/// Product not found page.
#[derive(Template, WebTemplate)]
#[template(path = "products/not_found.html")]
pub struct ProductNotFoundTemplate {
    pub current_user: Option<CurrentUser>,
}

/// Next page of the catalog grid (infinite scroll).
#[instrument(skip(state))]
pub async fn more(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<ProductPageTemplate, AppError> {
    let catalog = state.catalog();
    let page = catalog.page(&filter).await?;

    Ok(ProductPageTemplate {
        next_page_url: next_page_url(&filter, &page),
        products: views(&page.products),
    })
}

/// Display product detail page.
#[instrument(skip(state, current_user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let catalog = state.catalog();
    let product = match catalog.product(ProductId::new(id)).await {
        Ok(product) => product,
        Err(RepositoryError::NotFound) => {
            return Ok((
                StatusCode::NOT_FOUND,
                ProductNotFoundTemplate { current_user },
            )
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let related_products = match product.category_id {
        Some(category) => {
            let filter = ProductFilter {
                category_id: Some(category.to_string()),
                limit: Some(RELATED_FETCH),
                ..ProductFilter::default()
            };
            catalog
                .page(&filter)
                .await?
                .products
                .iter()
                .filter(|p| p.id != product.id)
                .take(RELATED_LIMIT)
                .map(ProductView::from)
                .collect()
        }
        None => Vec::new(),
    };

    Ok(ProductShowTemplate {
        current_user,
        product: ProductView::from(&product),
        related_products,
    }
    .into_response())
}

/// Display quick view fragment (for HTMX).
#[instrument(skip(state))]
pub async fn quick_view(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<QuickViewTemplate, AppError> {
    let product = match state.catalog().product(ProductId::new(id)).await {
        Ok(product) => product,
        Err(RepositoryError::NotFound) => {
            return Err(AppError::NotFound("Product not found".to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    Ok(QuickViewTemplate {
        product: ProductView::from(&product),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_page_url_keeps_filters() {
        let filter = ProductFilter {
            style: Some("Modern".to_string()),
            ..ProductFilter::default()
        };
        let page = ProductPage {
            products: Vec::new(),
            page: 2,
            has_more: true,
        };
        assert_eq!(
            next_page_url(&filter, &page).as_deref(),
            Some("/products/more?style=Modern&page=3")
        );

        let last = ProductPage {
            products: Vec::new(),
            page: 2,
            has_more: false,
        };
        assert_eq!(next_page_url(&filter, &last), None);
    }

    #[test]
    fn test_next_page_url_without_filters() {
        let page = ProductPage {
            products: Vec::new(),
            page: 1,
            has_more: true,
        };
        assert_eq!(
            next_page_url(&ProductFilter::default(), &page).as_deref(),
            Some("/products/more?page=2")
        );
    }
}
