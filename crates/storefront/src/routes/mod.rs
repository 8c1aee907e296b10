//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (filters in the query string)
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Products
//! GET  /products/more          - Next page of product cards (HTMX)
//! GET  /products/{id}          - Product detail
//! GET  /products/{id}/quick-view - Quick view fragment (HTMX)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! GET  /cart/sidebar           - Cart sidebar fragment
//! POST /cart/add               - Add to cart (toast, triggers cart-updated)
//! POST /cart/add-all           - Add several products (room assistant)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout (requires auth)
//! GET  /checkout               - Current wizard step
//! POST /checkout/shipping      - Submit step 1
//! POST /checkout/payment       - Submit step 2
//! POST /checkout/back          - Previous step
//! POST /checkout/edit/{step}   - Jump back to a completed step
//! POST /checkout/promo         - Apply a promo code
//! POST /checkout/place         - Place the order
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action (rate limited)
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action (rate limited)
//! POST /auth/logout            - Logout action
//!
//! # Account (requires auth)
//! GET  /account                - Account overview
//! GET  /account/orders         - Order history
//! GET  /account/orders/{id}    - Order detail
//!
//! # Room assistant
//! GET  /room                   - Upload page
//! POST /room/analyze           - Analysis fragment (HTMX, multipart)
//!
//! # JSON API (rate limited)
//! POST   /api/auth/register    - Create account
//! POST   /api/auth/login       - Issue bearer token
//! POST   /api/auth/logout      - Revoke bearer token
//! GET    /api/auth/profile     - Current user
//! GET    /api/products         - Product list
//! GET    /api/products/featured - Newest products
//! GET    /api/products/{id}    - Product detail
//! GET    /api/categories       - Categories
//! GET    /api/styles           - Styles
//! GET    /api/cart             - Cart
//! POST   /api/cart/add         - Add to cart
//! PUT    /api/cart/update      - Update quantity
//! DELETE /api/cart?product_id= - Remove item
//! GET    /api/balance          - Fresh balance
//! POST   /api/checkout         - Place an order
//! POST   /api/ai-analysis      - Room analysis
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod room;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Headroom for the multipart framing and text fields around the image.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Create the auth routes router.
///
/// Only the credential-checking POSTs are rate limited.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route_layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .merge(limited)
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/more", get(products::more))
        .route("/{id}", get(products::show))
        .route("/{id}/quick-view", get(products::quick_view))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/sidebar", get(cart::sidebar))
        .route("/add", post(cart::add))
        .route("/add-all", post(cart::add_all))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/shipping", post(checkout::shipping))
        .route("/payment", post(checkout::payment))
        .route("/back", post(checkout::back))
        .route("/edit/{step}", post(checkout::edit))
        .route("/promo", post(checkout::promo))
        .route("/place", post(checkout::place))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders", get(account::index))
        .route("/orders/{id}", get(account::order))
}

/// Create the room assistant routes router.
pub fn room_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(room::show))
        .route(
            "/analyze",
            post(room::analyze).layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD)),
        )
}

/// Create the JSON API router.
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    let auth_limited = Router::new()
        .route("/auth/register", post(api::auth::register))
        .route("/auth/login", post(api::auth::login))
        .route_layer(auth_rate_limiter());

    Router::new()
        .route("/auth/logout", post(api::auth::logout))
        .route("/auth/profile", get(api::auth::profile))
        .route("/products", get(api::products::list))
        .route("/products/featured", get(api::products::featured))
        .route("/products/{id}", get(api::products::show))
        .route("/categories", get(api::products::categories))
        .route("/styles", get(api::products::styles))
        .route("/cart", get(api::cart::show).delete(api::cart::remove))
        .route("/cart/add", post(api::cart::add))
        .route("/cart/update", put(api::cart::update))
        .route("/balance", get(api::cart::balance))
        .route("/checkout", post(api::checkout::place))
        .route(
            "/ai-analysis",
            post(api::room::analyze)
                .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD)),
        )
        .merge(auth_limited)
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/account", account_routes())
        .nest("/auth", auth_routes())
        .nest("/room", room_routes(max_upload_bytes))
        .nest("/api", api_routes(max_upload_bytes))
}
