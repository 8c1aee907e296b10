//! Home page route handler: the filterable catalog grid.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::models::product::{Category, ProductFilter};
use crate::routes::products::{ProductView, next_page_url, views};
use crate::state::AppState;

/// Current filter bar values, echoed back into the form.
#[derive(Clone, Default)]
pub struct FilterView {
    /// Selected category id, 0 for all.
    pub category_id: i32,
    pub style: String,
    pub min_price: String,
    pub max_price: String,
    pub search: String,
}

impl From<&ProductFilter> for FilterView {
    fn from(filter: &ProductFilter) -> Self {
        Self {
            category_id: filter.category().map_or(0, |id| id.as_i32()),
            style: filter.style().unwrap_or_default().to_string(),
            min_price: filter.min_price.clone().unwrap_or_default(),
            max_price: filter.max_price.clone().unwrap_or_default(),
            search: filter.search_term().unwrap_or_default().to_string(),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub current_user: Option<CurrentUser>,
    pub featured: Vec<ProductView>,
    pub products: Vec<ProductView>,
    pub next_page_url: Option<String>,
    pub categories: Vec<Category>,
    pub styles: Vec<String>,
    pub filter: FilterView,
    pub filtered: bool,
}

/// Display the home page.
///
/// The featured strip only shows on the unfiltered first page.
#[instrument(skip(state, current_user))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Query(filter): Query<ProductFilter>,
) -> Result<HomeTemplate, AppError> {
    let catalog = state.catalog();
    let filtered = !filter.query_string().is_empty();

    let page = catalog.page(&filter).await?;
    let featured = if filtered || page.page > 1 {
        Vec::new()
    } else {
        views(&catalog.featured().await?)
    };

    Ok(HomeTemplate {
        current_user,
        featured,
        next_page_url: next_page_url(&filter, &page),
        products: views(&page.products),
        categories: catalog.categories().await?,
        styles: catalog.styles().await?,
        filter: FilterView::from(&filter),
        filtered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_view_defaults_to_all() {
        let view = FilterView::from(&ProductFilter::default());
        assert_eq!(view.category_id, 0);
        assert!(view.style.is_empty());
        assert!(view.search.is_empty());
    }

    #[test]
    fn test_filter_view_echoes_selection() {
        let filter = ProductFilter {
            category_id: Some("4".to_string()),
            search: Some(" lamp ".to_string()),
            max_price: Some("250".to_string()),
            ..ProductFilter::default()
        };
        let view = FilterView::from(&filter);
        assert_eq!(view.category_id, 4);
        assert_eq!(view.search, "lamp");
        assert_eq!(view.max_price, "250");
    }
}
