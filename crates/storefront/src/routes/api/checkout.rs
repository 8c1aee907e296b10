//! Order placement API.
//!
//! The browser wizard collects the same data step by step; API clients
//! send it in one request.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use furnish_core::PaymentMethod;
use furnish_core::checkout::ShippingForm;
use furnish_core::promo::PromoCode;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::ApiUser;
use crate::services::checkout::{CheckoutService, OrderRequest};
use crate::state::AppState;

/// Body of `POST /api/checkout`.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: Option<ShippingForm>,
    pub billing_address: Option<ShippingForm>,
    pub payment_method: Option<String>,
    pub promo_code: Option<String>,
}

impl CheckoutRequest {
    /// Validate every part of the request.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` naming the first missing or invalid part.
    pub fn into_order(self) -> Result<OrderRequest> {
        let shipping = self.shipping_address.ok_or_else(|| missing("shipping_address"))?;
        let method = self
            .payment_method
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| missing("payment_method"))?;

        let shipping_address = shipping.validate().map_err(|e| invalid("shipping_address", &e.fields))?;
        let billing_address = self
            .billing_address
            .map(|b| b.validate().map_err(|e| invalid("billing_address", &e.fields)))
            .transpose()?;
        let payment_method = method
            .trim()
            .parse::<PaymentMethod>()
            .map_err(|_| AppError::BadRequest("Invalid payment method".to_string()))?;
        let promo = self
            .promo_code
            .filter(|c| !c.trim().is_empty())
            .map(|c| PromoCode::parse(&c).map_err(|e| AppError::BadRequest(e.to_string())))
            .transpose()?;

        Ok(OrderRequest {
            shipping_address,
            billing_address,
            payment_method,
            promo,
        })
    }
}

fn missing(field: &str) -> AppError {
    AppError::BadRequest(format!("Missing required field: {field}"))
}

fn invalid(part: &str, fields: &[&str]) -> AppError {
    AppError::BadRequest(format!("Invalid {part}: {}", fields.join(", ")))
}

/// Place an order for the caller's cart.
///
/// POST /api/checkout
///
/// # Errors
///
/// 400 for a bad request, an empty cart, short stock or short balance.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let order = request.into_order()?;
    let placed = CheckoutService::new(state.pool(), state.pricing())
        .place_order(user.id, &order)
        .await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_number", placed.order_number.as_str())]),
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Order placed successfully",
            "order_number": placed.order_number,
            "order_id": placed.order_id,
            "total": placed.totals.total,
            "totals": placed.totals,
            "new_balance": placed.new_balance,
        })),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address() -> ShippingForm {
        ShippingForm {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+1 555 123 4567".to_string(),
            address: "1 Analytical Way".to_string(),
            city: "London".to_string(),
            state: "LN".to_string(),
            zip_code: "12345".to_string(),
            country: "UK".to_string(),
        }
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::BadRequest(msg) => msg,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_shipping_address() {
        let request = CheckoutRequest {
            shipping_address: None,
            billing_address: None,
            payment_method: Some("card".to_string()),
            promo_code: None,
        };
        assert_eq!(
            message(request.into_order().unwrap_err()),
            "Missing required field: shipping_address"
        );
    }

    #[test]
    fn test_missing_payment_method() {
        let request = CheckoutRequest {
            shipping_address: Some(address()),
            billing_address: None,
            payment_method: Some("  ".to_string()),
            promo_code: None,
        };
        assert_eq!(
            message(request.into_order().unwrap_err()),
            "Missing required field: payment_method"
        );
    }

    #[test]
    fn test_invalid_address_fields_listed() {
        let mut shipping = address();
        shipping.city = String::new();
        let request = CheckoutRequest {
            shipping_address: Some(shipping),
            billing_address: None,
            payment_method: Some("card".to_string()),
            promo_code: None,
        };
        assert_eq!(
            message(request.into_order().unwrap_err()),
            "Invalid shipping_address: city"
        );
    }

    #[test]
    fn test_valid_request_with_promo() {
        let request = CheckoutRequest {
            shipping_address: Some(address()),
            billing_address: None,
            payment_method: Some("paypal".to_string()),
            promo_code: Some("save10".to_string()),
        };
        let order = request.into_order().unwrap();
        assert_eq!(order.payment_method, PaymentMethod::PayPal);
        assert_eq!(order.promo, Some(PromoCode::Save10));
        assert!(order.billing_address.is_none());
        assert_eq!(order.shipping_address.city, "London");
    }

    #[test]
    fn test_unknown_payment_method() {
        let request = CheckoutRequest {
            shipping_address: Some(address()),
            billing_address: None,
            payment_method: Some("cash".to_string()),
            promo_code: None,
        };
        assert_eq!(
            message(request.into_order().unwrap_err()),
            "Invalid payment method"
        );
    }
}
