//! Room assistant service.
//!
//! Validates the uploaded photo, runs the deterministic suggestion
//! generator and attaches real catalog products to each suggestion. The
//! photo itself is never stored.

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use furnish_core::Money;
use furnish_core::room::{self, ImageKind, RoomType, Style, Suggestion, UploadError};

use crate::db::RepositoryError;
use crate::models::product::Product;
use crate::services::catalog::CatalogService;

/// Catalog hits fetched per search term.
const MATCHES_PER_TERM: u32 = 3;
/// Products attached to one suggestion.
const MAX_MATCHES: usize = 3;

/// Errors from room analysis.
#[derive(Debug, Error)]
pub enum RoomError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// An uploaded room photo and the shopper's choices.
#[derive(Debug, Clone, Copy)]
pub struct RoomUpload<'a> {
    pub content_type: Option<&'a str>,
    pub len: usize,
    pub room_type: &'a str,
    pub style_preference: &'a str,
}

/// A generated suggestion with products from the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionMatch {
    pub ai_suggestion: Suggestion,
    pub matching_products: Vec<Product>,
    pub estimated_price: Money,
}

/// A finished analysis.
#[derive(Debug, Clone)]
pub struct RoomReport {
    pub image: ImageKind,
    pub room_type: RoomType,
    pub style: Style,
    pub suggestions: Vec<SuggestionMatch>,
    pub total_cost: Money,
    pub style_analysis: String,
}

/// Room assistant service.
pub struct RoomService<'a> {
    catalog: CatalogService<'a>,
    max_upload_bytes: usize,
}

impl<'a> RoomService<'a> {
    #[must_use]
    pub const fn new(catalog: CatalogService<'a>, max_upload_bytes: usize) -> Self {
        Self {
            catalog,
            max_upload_bytes,
        }
    }

    /// Analyze an uploaded room photo.
    ///
    /// Unknown room types and styles fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns `RoomError::Upload` if the photo is missing, of the wrong
    /// type or too large, and `RoomError::Repository` if product matching
    /// fails.
    #[instrument(skip(self, upload), fields(room = upload.room_type, style = upload.style_preference))]
    pub async fn analyze(&self, upload: RoomUpload<'_>) -> Result<RoomReport, RoomError> {
        let image = room::check_upload(upload.content_type, upload.len, self.max_upload_bytes)?;

        let analysis = room::analyze(
            RoomType::parse_or_default(upload.room_type),
            Style::parse_or_default(upload.style_preference),
        );

        let mut suggestions = Vec::with_capacity(analysis.suggestions.len());
        for suggestion in analysis.suggestions {
            let matching_products = self.matching_products(&suggestion).await?;
            suggestions.push(SuggestionMatch {
                estimated_price: suggestion.price,
                ai_suggestion: suggestion,
                matching_products,
            });
        }

        tracing::info!(suggestions = suggestions.len(), "Room analyzed");

        Ok(RoomReport {
            image,
            room_type: analysis.room_type,
            style: analysis.style,
            suggestions,
            total_cost: analysis.total_cost,
            style_analysis: analysis.style_analysis,
        })
    }

    async fn matching_products(
        &self,
        suggestion: &Suggestion,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut found = Vec::new();
        for term in suggestion.search_terms() {
            found.extend(self.catalog.search(term, MATCHES_PER_TERM).await?);
            if found.len() >= MAX_MATCHES {
                break;
            }
        }
        Ok(dedupe_matches(found))
    }
}

/// Keep the first occurrence of each product, at most [`MAX_MATCHES`].
fn dedupe_matches(products: Vec<Product>) -> Vec<Product> {
    let mut out: Vec<Product> = Vec::with_capacity(MAX_MATCHES);
    for product in products {
        if out.len() == MAX_MATCHES {
            break;
        }
        if !out.iter().any(|p| p.id == product.id) {
            out.push(product);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use furnish_core::ProductId;

    fn product(id: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: None,
            price: Money::from_cents(10_000),
            category_id: None,
            category_name: None,
            style: None,
            material: None,
            color: None,
            dimensions: None,
            image_url: None,
            stock_quantity: 1,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_dedupe_keeps_order_and_caps() {
        let ids: Vec<i32> = dedupe_matches(vec![product(4), product(2), product(4), product(9), product(1)])
            .iter()
            .map(|p| p.id.as_i32())
            .collect();
        assert_eq!(ids, [4, 2, 9]);
    }

    #[test]
    fn test_dedupe_empty() {
        assert!(dedupe_matches(Vec::new()).is_empty());
    }
}
