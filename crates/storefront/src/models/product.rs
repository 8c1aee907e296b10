//! Catalog domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use furnish_core::cart::CartItem;
use furnish_core::{CategoryId, Money, ProductId};

/// A product in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub style: Option<String>,
    pub material: Option<String>,
    pub color: Option<String>,
    pub dimensions: Option<String>,
    pub image_url: Option<String>,
    pub stock_quantity: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    /// A cart line for `quantity` units of this product.
    #[must_use]
    pub fn cart_line(&self, quantity: u32) -> CartItem {
        CartItem {
            product_id: self.id,
            name: self.name.clone(),
            price: self.price,
            quantity,
            stock_quantity: self.stock_quantity,
            image_url: self.image_url.clone(),
            style: self.style.clone(),
            material: self.material.clone(),
        }
    }
}

/// A product category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

/// Catalog listing filters, as sent by the filter bar and the JSON API.
///
/// Blank strings from HTML forms count as "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProductFilter {
    pub category_id: Option<String>,
    pub style: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub page: Option<u32>,
}

impl ProductFilter {
    /// Search by free text only.
    #[must_use]
    pub fn search(term: &str, limit: u32) -> Self {
        Self {
            search: Some(term.to_owned()),
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Selected category; blank, zero or garbage means "all".
    #[must_use]
    pub fn category(&self) -> Option<CategoryId> {
        non_blank(self.category_id.as_deref())
            .and_then(|s| s.parse::<i32>().ok())
            .filter(|id| *id > 0)
            .map(CategoryId::new)
    }

    #[must_use]
    pub fn style(&self) -> Option<&str> {
        non_blank(self.style.as_deref())
    }

    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        non_blank(self.search.as_deref())
    }

    /// Lower price bound; unparsable input is ignored.
    #[must_use]
    pub fn min_price(&self) -> Option<Money> {
        non_blank(self.min_price.as_deref()).and_then(|s| s.parse().ok())
    }

    /// Upper price bound; unparsable input is ignored.
    #[must_use]
    pub fn max_price(&self) -> Option<Money> {
        non_blank(self.max_price.as_deref()).and_then(|s| s.parse().ok())
    }

    /// 1-based page number.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// The same filters pointed at another page.
    #[must_use]
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: Some(page),
            ..self.clone()
        }
    }

    /// Query string for "load more" links, without the page parameter.
    #[must_use]
    pub fn query_string(&self) -> String {
        let mut pairs = url::form_urlencoded::Serializer::new(String::new());
        if let Some(id) = self.category() {
            pairs.append_pair("category_id", &id.to_string());
        }
        if let Some(style) = self.style() {
            pairs.append_pair("style", style);
        }
        if let Some(min) = non_blank(self.min_price.as_deref()) {
            pairs.append_pair("min_price", min);
        }
        if let Some(max) = non_blank(self.max_price.as_deref()) {
            pairs.append_pair("max_price", max);
        }
        if let Some(search) = self.search_term() {
            pairs.append_pair("search", search);
        }
        pairs.finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_filters_are_unset() {
        let filter = ProductFilter {
            category_id: Some("0".to_string()),
            style: Some("  ".to_string()),
            max_price: Some(String::new()),
            search: Some(" oak ".to_string()),
            ..ProductFilter::default()
        };
        assert_eq!(filter.category(), None);
        assert_eq!(filter.style(), None);
        assert_eq!(filter.max_price(), None);
        assert_eq!(filter.search_term(), Some("oak"));
        assert_eq!(filter.page(), 1);
    }

    #[test]
    fn test_price_bounds_parse() {
        let filter = ProductFilter {
            min_price: Some("100".to_string()),
            max_price: Some("not a price".to_string()),
            ..ProductFilter::default()
        };
        assert_eq!(filter.min_price(), Some(Money::from_cents(10_000)));
        assert_eq!(filter.max_price(), None);
    }

    #[test]
    fn test_query_string_skips_page() {
        let filter = ProductFilter {
            style: Some("Modern".to_string()),
            search: Some("oak table".to_string()),
            page: Some(3),
            ..ProductFilter::default()
        };
        assert_eq!(filter.query_string(), "style=Modern&search=oak+table");
        assert_eq!(filter.with_page(4).page(), 4);
    }
}
