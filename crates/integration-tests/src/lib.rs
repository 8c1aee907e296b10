//! Integration tests for Furnish.
//!
//! # Running Tests
//!
//! ```bash
//! # Shopping rules through the public core API (no services needed)
//! cargo test -p furnish-integration-tests
//!
//! # Against a running storefront with a migrated, seeded database
//! cargo run -p furnish-cli -- migrate
//! cargo run -p furnish-cli -- seed catalog
//! cargo run -p furnish-storefront &
//! cargo test -p furnish-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `shopping_flow` - Cart, pricing, promo, checkout and room rules end to end
//! - `storefront_api` - JSON API against a live server

/// Base URL for the storefront under test.
///
/// Reads `STOREFRONT_BASE_URL`, defaulting to the local dev server.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}
