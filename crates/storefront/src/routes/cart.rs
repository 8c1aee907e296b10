//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Guests keep their cart in the session; signed-in shoppers in the
//! database. Every mutation sends an `HX-Trigger: cart-updated` header so
//! the header badge and sidebar refresh themselves.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use furnish_core::ProductId;
use furnish_core::cart::{Cart, CartItem};
use furnish_core::pricing::{CheckoutGate, OrderTotals};

use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::services::cart::{CartOwner, CartService, CartServiceError, CartSummary};
use crate::state::AppState;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: i32,
    pub name: String,
    pub image_url: Option<String>,
    pub style: Option<String>,
    pub material: Option<String>,
    pub quantity: u32,
    pub stock_quantity: u32,
    /// The plus button is disabled at the stock limit.
    pub at_stock_limit: bool,
    pub price: String,
    pub line_price: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.as_i32(),
            name: item.name.clone(),
            image_url: item.image_url.clone(),
            style: item.style.clone(),
            material: item.material.clone(),
            quantity: item.quantity,
            stock_quantity: item.stock_quantity,
            at_stock_limit: item.quantity >= item.stock_quantity,
            price: item.price.to_string(),
            line_price: item.subtotal().to_string(),
        }
    }
}

/// Order totals formatted for templates.
#[derive(Clone)]
pub struct TotalsView {
    pub subtotal: String,
    pub discount: Option<String>,
    /// `FREE` once the threshold is passed.
    pub shipping: String,
    pub tax: String,
    pub total: String,
}

impl TotalsView {
    #[must_use]
    pub fn new(totals: &OrderTotals, has_items: bool) -> Self {
        Self {
            subtotal: totals.subtotal.to_string(),
            discount: (!totals.discount.is_zero()).then(|| totals.discount.to_string()),
            shipping: if has_items && totals.ships_free() {
                "FREE".to_string()
            } else {
                totals.shipping.to_string()
            },
            tax: totals.tax.to_string(),
            total: totals.total.to_string(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub totals: TotalsView,
    pub free_shipping_message: Option<String>,
    /// Signed-in shoppers see their balance and what remains after paying.
    pub balance: Option<String>,
    pub balance_after: Option<String>,
    pub can_afford: bool,
    pub shortage: Option<String>,
    pub checkout_enabled: bool,
    pub checkout_label: &'static str,
    pub checkout_href: &'static str,
    /// Inline error from the last action.
    pub error: Option<String>,
}

impl From<&CartSummary> for CartView {
    fn from(summary: &CartSummary) -> Self {
        let shortage = match summary.gate {
            CheckoutGate::InsufficientBalance { shortage } => Some(shortage.to_string()),
            _ => None,
        };

        Self {
            items: summary.items.iter().map(CartItemView::from).collect(),
            item_count: summary.count,
            totals: TotalsView::new(&summary.totals, !summary.items.is_empty()),
            free_shipping_message: summary
                .free_shipping_remaining
                .map(|remaining| format!("Add {remaining} more for free shipping!")),
            balance: summary.balance.map(|b| b.to_string()),
            balance_after: summary.balance_after().map(|b| b.to_string()),
            can_afford: summary.gate.can_afford(),
            shortage,
            checkout_enabled: summary.gate.enabled(),
            checkout_label: summary.gate.label(),
            checkout_href: match summary.gate {
                CheckoutGate::LoginRequired => "/auth/login?next=/checkout",
                _ => "/checkout",
            },
            error: None,
        }
    }
}

impl CartView {
    fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }
}

/// Shopper-facing text for a failed cart action.
fn error_message(err: &CartServiceError) -> String {
    match err {
        CartServiceError::ProductNotFound(_) | CartServiceError::Cart(_) => err.to_string(),
        CartServiceError::Session(_) | CartServiceError::Repository(_) => {
            tracing::error!("Cart operation failed: {err}");
            "Something went wrong updating your cart.".to_string()
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
    pub quantity: Option<u32>,
}

/// Add several products at once (room assistant "add all").
#[derive(Debug, Deserialize)]
pub struct AddAllForm {
    /// Comma-separated product ids.
    pub product_ids: String,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: i32,
    /// Zero or less removes the line.
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i32,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub current_user: Option<CurrentUser>,
    pub cart: CartView,
}

/// Cart sidebar fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_sidebar.html")]
pub struct CartSidebarTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Toast notification fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/toast.html")]
pub struct ToastTemplate {
    pub message: String,
    pub is_error: bool,
}

impl ToastTemplate {
    fn success(message: String) -> Self {
        Self {
            message,
            is_error: false,
        }
    }

    fn error(message: String) -> Self {
        Self {
            message,
            is_error: true,
        }
    }
}

async fn load_view(state: &AppState, session: &Session, owner: CartOwner) -> CartView {
    match CartService::new(state.pool(), session, owner)
        .summary(&state.pricing())
        .await
    {
        Ok(summary) => CartView::from(&summary),
        Err(e) => {
            let message = error_message(&e);
            let empty = CartSummary::new(Cart::default(), None, &state.pricing());
            CartView::from(&empty).with_error(Some(message))
        }
    }
}

/// Display cart page.
#[instrument(skip(state, session, current_user))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(current_user): OptionalAuth,
) -> impl IntoResponse {
    let owner = CartOwner::from(current_user.as_ref());
    let cart = load_view(&state, &session, owner).await;

    CartShowTemplate { current_user, cart }
}

/// Cart sidebar contents (HTMX).
#[instrument(skip(state, session, current_user))]
pub async fn sidebar(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(current_user): OptionalAuth,
) -> impl IntoResponse {
    let owner = CartOwner::from(current_user.as_ref());
    CartSidebarTemplate {
        cart: load_view(&state, &session, owner).await,
    }
}

/// Add item to cart (HTMX).
///
/// Returns a toast and an HTMX trigger to update the cart count badge.
#[instrument(skip(state, session, current_user))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(current_user): OptionalAuth,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let owner = CartOwner::from(current_user.as_ref());
    let product_id = ProductId::new(form.product_id);
    let cart = CartService::new(state.pool(), &session, owner);

    match cart.add(product_id, form.quantity.unwrap_or(1)).await {
        Ok(quantity) => {
            let id = product_id.to_string();
            add_breadcrumb("cart", "Added to cart", Some(&[("product_id", id.as_str())]));
            (
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                ToastTemplate::success(format!("Added to cart ({quantity} in cart)")),
            )
                .into_response()
        }
        Err(e) => ToastTemplate::error(error_message(&e)).into_response(),
    }
}

/// Add every listed product to the cart, one of each (HTMX).
#[instrument(skip(state, session, current_user))]
pub async fn add_all(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(current_user): OptionalAuth,
    Form(form): Form<AddAllForm>,
) -> Response {
    let ids = parse_product_ids(&form.product_ids);
    if ids.is_empty() {
        return ToastTemplate::error("No products to add.".to_string()).into_response();
    }

    let owner = CartOwner::from(current_user.as_ref());
    match CartService::new(state.pool(), &session, owner)
        .add_many(&ids)
        .await
    {
        Ok(0) => ToastTemplate::error("None of these products are available.".to_string())
            .into_response(),
        Ok(added) => (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            ToastTemplate::success(format!("Added {added} items to cart")),
        )
            .into_response(),
        Err(e) => ToastTemplate::error(error_message(&e)).into_response(),
    }
}

/// Update cart item quantity (HTMX).
#[instrument(skip(state, session, current_user))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(current_user): OptionalAuth,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let owner = CartOwner::from(current_user.as_ref());
    let result = CartService::new(state.pool(), &session, owner)
        .update(ProductId::new(form.product_id), form.quantity)
        .await;

    let error = result.err().map(|e| error_message(&e));
    let cart = load_view(&state, &session, owner).await.with_error(error);
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate { cart },
    )
        .into_response()
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session, current_user))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(current_user): OptionalAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let owner = CartOwner::from(current_user.as_ref());
    let result = CartService::new(state.pool(), &session, owner)
        .remove(ProductId::new(form.product_id))
        .await;

    let error = result.err().map(|e| error_message(&e));
    let cart = load_view(&state, &session, owner).await.with_error(error);
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartItemsTemplate { cart },
    )
        .into_response()
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session, current_user))]
pub async fn count(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(current_user): OptionalAuth,
) -> impl IntoResponse {
    let owner = CartOwner::from(current_user.as_ref());
    let count = CartService::new(state.pool(), &session, owner)
        .count()
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to count cart: {e}");
            0
        });

    CartCountTemplate { count }
}

/// Parse `"1, 2,x,3"` into product ids, skipping anything unparsable.
fn parse_product_ids(raw: &str) -> Vec<ProductId> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<i32>().ok())
        .filter(|id| *id > 0)
        .map(ProductId::new)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use furnish_core::Money;
    use furnish_core::pricing::PricingPolicy;

    fn line(id: i32, cents: i64, quantity: u32, stock: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Money::from_cents(cents),
            quantity,
            stock_quantity: stock,
            image_url: None,
            style: None,
            material: None,
        }
    }

    #[test]
    fn test_parse_product_ids() {
        assert_eq!(
            parse_product_ids("1, 2,x,,-4,3"),
            vec![ProductId::new(1), ProductId::new(2), ProductId::new(3)]
        );
        assert!(parse_product_ids("").is_empty());
    }

    #[test]
    fn test_guest_view_points_to_login() {
        let cart = Cart::from_items(vec![line(1, 5000, 1, 3)]);
        let summary = CartSummary::new(cart, None, &PricingPolicy::default());
        let view = CartView::from(&summary);

        assert!(view.checkout_enabled);
        assert_eq!(view.checkout_href, "/auth/login?next=/checkout");
        assert_eq!(view.balance, None);
        assert_eq!(view.totals.shipping, "$19.99");
    }

    #[test]
    fn test_short_balance_disables_checkout() {
        let cart = Cart::from_items(vec![line(1, 12_000, 1, 3)]);
        let summary = CartSummary::new(
            cart,
            Some(Money::from_cents(10_000)),
            &PricingPolicy::default(),
        );
        let view = CartView::from(&summary);

        assert!(!view.checkout_enabled);
        assert!(!view.can_afford);
        assert_eq!(view.checkout_label, "Insufficient Balance");
        assert_eq!(view.totals.shipping, "FREE");
        assert_eq!(view.totals.total, "$129.60");
        assert_eq!(view.shortage.as_deref(), Some("$29.60"));
        assert_eq!(view.balance_after.as_deref(), Some("-$29.60"));
    }

    #[test]
    fn test_stock_limit_flag() {
        let view = CartItemView::from(&line(2, 1000, 3, 3));
        assert!(view.at_stock_limit);
        assert_eq!(view.line_price, "$30.00");
    }
}
