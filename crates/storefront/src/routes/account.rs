//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use furnish_core::checkout::ShippingDetails;
use furnish_core::{OrderId, UserId};

use crate::db::orders::OrderRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::CurrentUser;
use crate::models::order::{Order, OrderSummary};
use crate::routes::cart::TotalsView;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// User display data for templates.
#[derive(Clone)]
pub struct UserView {
    pub username: String,
    pub email: String,
    pub name: String,
    pub balance: String,
    pub member_since: String,
}

/// Order history row for templates.
#[derive(Clone)]
pub struct OrderView {
    pub id: i32,
    pub number: String,
    pub date: String,
    pub status: &'static str,
    pub status_code: &'static str,
    pub item_count: u32,
    pub total: String,
}

impl From<&OrderSummary> for OrderView {
    fn from(order: &OrderSummary) -> Self {
        Self {
            id: order.id.as_i32(),
            number: order.order_number.clone(),
            date: order.created_at.format("%B %-d, %Y").to_string(),
            status: order.status.label(),
            status_code: order.status.code(),
            item_count: order.item_count,
            total: order.total.to_string(),
        }
    }
}

/// Order line for the detail page.
#[derive(Clone)]
pub struct OrderLineView {
    pub product_id: i32,
    pub name: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub subtotal: String,
}

/// Address block for the detail page.
#[derive(Clone)]
pub struct AddressView {
    pub name: String,
    pub address: String,
    pub locality: String,
    pub country: String,
    pub email: String,
    pub phone: String,
}

impl From<&ShippingDetails> for AddressView {
    fn from(details: &ShippingDetails) -> Self {
        Self {
            name: details.full_name(),
            address: details.address.clone(),
            locality: details.locality_line(),
            country: details.country.clone(),
            email: details.email.clone(),
            phone: details.phone.clone(),
        }
    }
}

/// Full order for the detail page.
#[derive(Clone)]
pub struct OrderDetailView {
    pub number: String,
    pub date: String,
    pub status: &'static str,
    pub status_code: &'static str,
    pub payment_method: &'static str,
    pub shipping_address: AddressView,
    pub billing_address: AddressView,
    pub items: Vec<OrderLineView>,
    pub totals: TotalsView,
}

impl From<&Order> for OrderDetailView {
    fn from(order: &Order) -> Self {
        Self {
            number: order.order_number.clone(),
            date: order.created_at.format("%B %-d, %Y at %H:%M UTC").to_string(),
            status: order.status.label(),
            status_code: order.status.code(),
            payment_method: order.payment_method.display_name(),
            shipping_address: AddressView::from(&order.shipping_address),
            billing_address: AddressView::from(&order.billing_address),
            items: order
                .items
                .iter()
                .map(|item| OrderLineView {
                    product_id: item.product_id.as_i32(),
                    name: item.product_name.clone(),
                    image_url: item.image_url.clone(),
                    quantity: item.quantity,
                    price: item.price.to_string(),
                    subtotal: item.subtotal.to_string(),
                })
                .collect(),
            totals: TotalsView::new(&order.totals, true),
        }
    }
}

/// Query parameters for the order page.
#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    /// Set right after checkout to show the confirmation banner.
    pub placed: Option<u8>,
}

/// Account overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub current_user: Option<CurrentUser>,
    pub user: UserView,
    pub orders: Vec<OrderView>,
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderShowTemplate {
    pub current_user: Option<CurrentUser>,
    pub order: OrderDetailView,
    pub just_placed: bool,
}

/// Order not found page.
#[derive(Template, WebTemplate)]
#[template(path = "account/order_not_found.html")]
pub struct OrderNotFoundTemplate {
    pub current_user: Option<CurrentUser>,
}

async fn load_user(state: &AppState, id: UserId) -> Result<crate::models::user::User, AppError> {
    let auth = AuthService::new(state.pool(), state.config().shop.opening_balance);
    match auth.get_user(id).await {
        Ok(user) => Ok(user),
        Err(AuthError::UserNotFound) => {
            Err(AppError::Unauthorized("Authentication required".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Display account overview: profile, balance and order history.
#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
) -> Result<AccountIndexTemplate, AppError> {
    let user = load_user(&state, current_user.id).await?;
    let orders = OrderRepository::new(state.pool())
        .recent_for_user(user.id)
        .await?;

    Ok(AccountIndexTemplate {
        user: UserView {
            username: user.username.clone(),
            email: user.email.to_string(),
            name: user.full_name(),
            balance: user.balance.to_string(),
            member_since: user.created_at.format("%B %Y").to_string(),
        },
        orders: orders.iter().map(OrderView::from).collect(),
        current_user: Some(current_user),
    })
}

/// Display one order.
#[instrument(skip(state, current_user, query), fields(user_id = %current_user.id))]
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    Path(id): Path<i32>,
    Query(query): Query<OrderQuery>,
) -> Result<Response, AppError> {
    let found = OrderRepository::new(state.pool())
        .get_for_user(OrderId::new(id), current_user.id)
        .await?;

    let Some(order) = found else {
        return Ok((
            StatusCode::NOT_FOUND,
            OrderNotFoundTemplate {
                current_user: Some(current_user),
            },
        )
            .into_response());
    };

    Ok(OrderShowTemplate {
        current_user: Some(current_user),
        order: OrderDetailView::from(&order),
        just_placed: query.placed.is_some(),
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use furnish_core::{Money, OrderStatus};

    #[test]
    fn test_order_view_formatting() {
        let summary = OrderSummary {
            id: OrderId::new(12),
            order_number: "ORD-1700000000-3".to_string(),
            total: Money::from_cents(12_960),
            status: OrderStatus::Pending,
            item_count: 2,
            created_at: Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap(),
        };
        let view = OrderView::from(&summary);
        assert_eq!(view.id, 12);
        assert_eq!(view.date, "March 5, 2024");
        assert_eq!(view.status, "Pending");
        assert_eq!(view.total, "$129.60");
    }
}
