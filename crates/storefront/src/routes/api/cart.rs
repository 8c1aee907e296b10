//! Cart and balance API.
//!
//! Every response carries the refreshed cart so clients never compute
//! totals themselves.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use furnish_core::{Money, ProductId};

use crate::db::users::UserRepository;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::ApiUser;
use crate::services::cart::{CartOwner, CartService, CartSummary};
use crate::state::AppState;

/// Body of `POST /api/cart/add`.
#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub product_id: i32,
    pub quantity: Option<u32>,
}

/// Body of `PUT /api/cart/update`.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub product_id: i32,
    pub quantity: i64,
}

/// Query of `DELETE /api/cart`.
#[derive(Debug, Deserialize)]
pub struct RemoveQuery {
    pub product_id: i32,
}

fn cart_body(summary: &CartSummary, message: Option<&str>) -> Value {
    let mut body = json!({
        "success": true,
        "items": summary.items,
        "total": summary.totals.subtotal,
        "count": summary.count,
        "totals": summary.totals,
        "balance": summary.balance,
    });
    if let Some(message) = message {
        body["message"] = Value::from(message);
    }
    body
}

/// The caller's cart.
///
/// GET /api/cart
///
/// # Errors
///
/// 401 without authentication.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ApiUser(user): ApiUser,
) -> Result<Json<Value>> {
    let cart = CartService::new(state.pool(), &session, CartOwner::User(user.id));
    let summary = cart.summary(&state.pricing()).await?;
    Ok(Json(cart_body(&summary, None)))
}

/// Add a product.
///
/// POST /api/cart/add
///
/// # Errors
///
/// 404 for an unknown product, 400 when stock is short.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    ApiUser(user): ApiUser,
    Json(request): Json<AddRequest>,
) -> Result<Json<Value>> {
    let cart = CartService::new(state.pool(), &session, CartOwner::User(user.id));
    cart.add(
        ProductId::new(request.product_id),
        request.quantity.unwrap_or(1),
    )
    .await?;

    let id = request.product_id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", id.as_str())]));

    let summary = cart.summary(&state.pricing()).await?;
    Ok(Json(cart_body(&summary, Some("Item added to cart successfully"))))
}

/// Set a line's quantity; zero or less removes it.
///
/// PUT /api/cart/update
///
/// # Errors
///
/// 400 when the product is not in the cart or stock is short.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    ApiUser(user): ApiUser,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<Value>> {
    let cart = CartService::new(state.pool(), &session, CartOwner::User(user.id));
    cart.update(ProductId::new(request.product_id), request.quantity)
        .await?;

    let summary = cart.summary(&state.pricing()).await?;
    Ok(Json(cart_body(&summary, None)))
}

/// Remove a line.
///
/// DELETE /api/cart?product_id=N
///
/// # Errors
///
/// 401 without authentication.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    ApiUser(user): ApiUser,
    Query(query): Query<RemoveQuery>,
) -> Result<Json<Value>> {
    CartService::new(state.pool(), &session, CartOwner::User(user.id))
        .remove(ProductId::new(query.product_id))
        .await?;

    Ok(Json(
        json!({ "success": true, "message": "Item removed from cart" }),
    ))
}

/// The caller's current balance, read fresh.
///
/// GET /api/balance
///
/// # Errors
///
/// 401 without authentication.
pub async fn balance(State(state): State<AppState>, ApiUser(user): ApiUser) -> Result<Json<Value>> {
    let balance = UserRepository::new(state.pool()).get_balance(user.id).await?;
    Ok(Json(balance_body(balance, Utc::now())))
}

/// Balance response; `timestamp` is unix seconds.
fn balance_body(balance: Money, at: DateTime<Utc>) -> Value {
    json!({
        "success": true,
        "balance": balance,
        "timestamp": at.timestamp(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use furnish_core::cart::{Cart, CartItem};
    use furnish_core::pricing::PricingPolicy;

    #[test]
    fn test_cart_body_shape() {
        let cart = Cart::from_items(vec![CartItem {
            product_id: ProductId::new(5),
            name: "Oak Chair".to_string(),
            price: Money::from_cents(4_999),
            quantity: 2,
            stock_quantity: 10,
            image_url: None,
            style: Some("Classic".to_string()),
            material: None,
        }]);
        let summary = CartSummary::new(cart, Some(Money::from_cents(100_000)), &PricingPolicy::default());
        let body = cart_body(&summary, Some("Item added to cart successfully"));

        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 2);
        assert_eq!(body["total"], "99.98");
        assert_eq!(body["items"][0]["product_id"], 5);
        assert_eq!(body["message"], "Item added to cart successfully");
        assert_eq!(body["balance"], "1000.00");
    }

    #[test]
    fn test_balance_body_uses_unix_seconds() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let body = balance_body(Money::from_cents(87_500), at);

        assert_eq!(body["success"], true);
        assert_eq!(body["balance"], "875.00");
        assert_eq!(body["timestamp"], 1_700_000_000_i64);
    }
}
