//! Checkout wizard route handlers.
//!
//! Three steps (shipping, payment, review) kept in the session as a
//! [`CheckoutProgress`]. Successful steps redirect back to `/checkout`;
//! invalid forms re-render the current step with the failing fields
//! highlighted. Placing the order hands off to [`CheckoutService`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use furnish_core::checkout::{
    CheckoutError, CheckoutProgress, CheckoutStep, PaymentForm, ShippingForm,
};
use furnish_core::pricing::ensure_affordable;
use furnish_core::promo::PromoCode;

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, session_keys};
use crate::routes::cart::{CartItemView, TotalsView};
use crate::services::cart::{CartOwner, CartService};
use crate::services::checkout::{CheckoutService, CheckoutServiceError, OrderRequest};
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Progress bar entry.
#[derive(Clone)]
pub struct StepView {
    pub number: u8,
    pub title: &'static str,
    pub css_class: &'static str,
}

/// Shipping fields echoed back into the form.
#[derive(Clone, Default)]
pub struct ShippingView {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl From<&ShippingForm> for ShippingView {
    fn from(form: &ShippingForm) -> Self {
        Self {
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            email: form.email.clone(),
            phone: form.phone.clone(),
            address: form.address.clone(),
            city: form.city.clone(),
            state: form.state.clone(),
            zip_code: form.zip_code.clone(),
            country: form.country.clone(),
        }
    }
}

/// Review step summary of the chosen payment.
#[derive(Clone)]
pub struct PaymentView {
    pub method: String,
    pub method_name: &'static str,
    pub masked_card: Option<String>,
    pub card_name: String,
}

/// What the page needs to know about the last submission.
#[derive(Default)]
struct Notice {
    error: Option<String>,
    invalid_fields: Vec<&'static str>,
    promo_message: Option<String>,
    promo_error: Option<String>,
    shipping_input: Option<ShippingView>,
}

// =============================================================================
// Form Types
// =============================================================================

/// Promo code form data.
#[derive(Debug, Deserialize)]
pub struct PromoForm {
    #[serde(default)]
    pub promo_code: String,
}

/// Query parameters after a redirect.
#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    pub promo: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template (all three steps).
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub current_user: Option<CurrentUser>,
    pub step: u8,
    pub steps: Vec<StepView>,
    pub shipping: ShippingView,
    pub payment: Option<PaymentView>,
    pub items: Vec<CartItemView>,
    pub totals: TotalsView,
    pub promo_code: Option<&'static str>,
    pub promo_message: Option<String>,
    pub promo_error: Option<String>,
    pub balance: String,
    pub balance_after: String,
    pub can_afford: bool,
    pub shortage: Option<String>,
    pub error: Option<String>,
    pub invalid_fields: Vec<&'static str>,
}

impl CheckoutTemplate {
    /// Whether a form field failed validation.
    #[must_use]
    pub fn invalid(&self, field: &str) -> bool {
        self.invalid_fields.contains(&field)
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

async fn load_progress(session: &Session) -> Result<CheckoutProgress, AppError> {
    Ok(session
        .get::<CheckoutProgress>(session_keys::CHECKOUT)
        .await?
        .unwrap_or_default())
}

async fn save_progress(session: &Session, progress: &CheckoutProgress) -> Result<(), AppError> {
    session.insert(session_keys::CHECKOUT, progress).await?;
    Ok(())
}

/// Build the page from the session progress and a fresh cart.
///
/// Returns a redirect to the cart page when the cart is empty.
async fn render(
    state: &AppState,
    session: &Session,
    user: CurrentUser,
    progress: &CheckoutProgress,
    notice: Notice,
) -> Result<Response, AppError> {
    let summary = CartService::new(state.pool(), session, CartOwner::User(user.id))
        .summary(&state.pricing())
        .await?;
    if summary.items.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let pricing = state.pricing();
    let totals = pricing.totals(summary.totals.subtotal, progress.promo.map(PromoCode::rate));
    let balance = summary.balance.unwrap_or_default();
    let shortage = ensure_affordable(balance, totals.total)
        .err()
        .map(|e| e.shortage.to_string());

    let shipping = notice.shipping_input.unwrap_or_else(|| match &progress.shipping {
        Some(details) => ShippingView {
            first_name: details.first_name.clone(),
            last_name: details.last_name.clone(),
            email: details.email.clone(),
            phone: details.phone.clone(),
            address: details.address.clone(),
            city: details.city.clone(),
            state: details.state.clone(),
            zip_code: details.zip_code.clone(),
            country: details.country.clone(),
        },
        None => ShippingView {
            first_name: user.first_name.clone(),
            email: user.email.to_string(),
            ..ShippingView::default()
        },
    });

    let payment = progress.payment.as_ref().map(|p| PaymentView {
        method: p.method.code().to_string(),
        method_name: p.method_name(),
        masked_card: p.masked_card(),
        card_name: p.card_name.clone().unwrap_or_default(),
    });

    Ok(CheckoutTemplate {
        current_user: Some(user),
        step: progress.step.number(),
        steps: progress
            .progress()
            .into_iter()
            .map(|(step, step_state)| StepView {
                number: step.number(),
                title: step.title(),
                css_class: step_state.css_class(),
            })
            .collect(),
        shipping,
        payment,
        items: summary.items.iter().map(CartItemView::from).collect(),
        totals: TotalsView::new(&totals, true),
        promo_code: progress.promo.map(PromoCode::code),
        promo_message: notice.promo_message,
        promo_error: notice.promo_error,
        balance: balance.to_string(),
        balance_after: (balance - totals.total).to_string(),
        can_afford: shortage.is_none(),
        shortage,
        error: notice.error,
        invalid_fields: notice.invalid_fields,
    }
    .into_response())
}

/// Notice for a failed wizard action.
fn notice_for(err: &CheckoutError) -> Notice {
    match err {
        CheckoutError::Validation(validation) => Notice {
            error: Some(err.to_string()),
            invalid_fields: validation.fields.clone(),
            ..Notice::default()
        },
        CheckoutError::Promo(_) => Notice {
            promo_error: Some(err.to_string()),
            ..Notice::default()
        },
        CheckoutError::StepLocked(_) | CheckoutError::Incomplete(_) => Notice {
            error: Some("Please complete the previous steps first.".to_string()),
            ..Notice::default()
        },
    }
}

/// Shopper-facing text for a failed order.
fn order_error_message(err: &CheckoutServiceError) -> String {
    match err {
        CheckoutServiceError::InsufficientBalance(shortfall) => format!(
            "Insufficient balance. You need {} more to place this order.",
            shortfall.shortage
        ),
        CheckoutServiceError::Repository(_) => {
            "We could not place your order. Please try again.".to_string()
        }
        other => other.to_string(),
    }
}

// =============================================================================
// Routes
// =============================================================================

/// Display the current checkout step.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Query(query): Query<CheckoutQuery>,
) -> Result<Response, AppError> {
    let progress = load_progress(&session).await?;
    let promo_message = match (query.promo.as_deref(), progress.promo) {
        (Some("applied"), Some(code)) => Some(code.applied_message()),
        _ => None,
    };

    render(
        &state,
        &session,
        user,
        &progress,
        Notice {
            promo_message,
            ..Notice::default()
        },
    )
    .await
}

/// Submit the shipping step.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn shipping(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ShippingForm>,
) -> Result<Response, AppError> {
    let mut progress = load_progress(&session).await?;
    match progress.submit_shipping(&form) {
        Ok(()) => {
            save_progress(&session, &progress).await?;
            Ok(Redirect::to("/checkout").into_response())
        }
        Err(e) => {
            let notice = Notice {
                shipping_input: Some(ShippingView::from(&form)),
                ..notice_for(&e)
            };
            render(&state, &session, user, &progress, notice).await
        }
    }
}

/// Submit the payment step.
///
/// Only the method, the last four card digits and the cardholder name are
/// kept.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn payment(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<PaymentForm>,
) -> Result<Response, AppError> {
    let mut progress = load_progress(&session).await?;
    let result = progress.submit_payment(&form);
    // A missing shipping step moves the wizard back to it.
    save_progress(&session, &progress).await?;

    match result {
        Ok(()) => Ok(Redirect::to("/checkout").into_response()),
        Err(e) => render(&state, &session, user, &progress, notice_for(&e)).await,
    }
}

/// Go back one step.
pub async fn back(session: Session, RequireAuth(_user): RequireAuth) -> Result<Redirect, AppError> {
    let mut progress = load_progress(&session).await?;
    progress.back();
    save_progress(&session, &progress).await?;
    Ok(Redirect::to("/checkout"))
}

/// Jump back to an earlier step from the review page.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn edit(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(step): Path<u8>,
) -> Result<Response, AppError> {
    let mut progress = load_progress(&session).await?;
    let Some(step) = CheckoutStep::from_number(step) else {
        return Ok(Redirect::to("/checkout").into_response());
    };

    match progress.edit(step) {
        Ok(()) => {
            save_progress(&session, &progress).await?;
            Ok(Redirect::to("/checkout").into_response())
        }
        Err(e) => render(&state, &session, user, &progress, notice_for(&e)).await,
    }
}

/// Apply a promo code.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn promo(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<PromoForm>,
) -> Result<Response, AppError> {
    let mut progress = load_progress(&session).await?;
    match progress.apply_promo(&form.promo_code) {
        Ok(code) => {
            save_progress(&session, &progress).await?;
            tracing::info!(promo = code.code(), "Promo code applied");
            Ok(Redirect::to("/checkout?promo=applied").into_response())
        }
        Err(e) => render(&state, &session, user, &progress, notice_for(&e)).await,
    }
}

/// Place the order from the review step.
///
/// On success the wizard state is dropped and the shopper lands on the
/// order confirmation.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Response, AppError> {
    let progress = load_progress(&session).await?;
    let (shipping, payment) = match progress.ready() {
        Ok(ready) => ready,
        Err(e) => return render(&state, &session, user, &progress, notice_for(&e)).await,
    };

    let request = OrderRequest {
        shipping_address: shipping.clone(),
        billing_address: None,
        payment_method: payment.method,
        promo: progress.promo,
    };

    match CheckoutService::new(state.pool(), state.pricing())
        .place_order(user.id, &request)
        .await
    {
        Ok(placed) => {
            session
                .remove::<CheckoutProgress>(session_keys::CHECKOUT)
                .await?;
            add_breadcrumb(
                "checkout",
                "Order placed",
                Some(&[("order_number", placed.order_number.as_str())]),
            );
            tracing::info!(
                order_number = %placed.order_number,
                total = %placed.totals.total,
                "Order placed"
            );
            Ok(Redirect::to(&format!("/account/orders/{}?placed=1", placed.order_id)).into_response())
        }
        Err(e) => {
            if matches!(e, CheckoutServiceError::Repository(_)) {
                tracing::error!("Order placement failed: {e}");
            } else {
                tracing::warn!("Order rejected: {e}");
            }
            let notice = Notice {
                error: Some(order_error_message(&e)),
                ..Notice::default()
            };
            render(&state, &session, user, &progress, notice).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use furnish_core::Money;
    use furnish_core::pricing::InsufficientBalance;
    use furnish_core::promo::PromoError;
    use furnish_core::validation::ValidationError;

    #[test]
    fn test_validation_notice_lists_fields() {
        let err = CheckoutError::Validation(ValidationError {
            fields: vec!["email", "zip_code"],
        });
        let notice = notice_for(&err);
        assert_eq!(notice.invalid_fields, vec!["email", "zip_code"]);
        assert_eq!(
            notice.error.as_deref(),
            Some("Please fill in all required fields correctly.")
        );
    }

    #[test]
    fn test_promo_notice() {
        let notice = notice_for(&CheckoutError::Promo(PromoError::Unknown));
        assert_eq!(notice.promo_error.as_deref(), Some("Invalid promo code."));
        assert!(notice.error.is_none());
    }

    #[test]
    fn test_order_error_messages() {
        let err = CheckoutServiceError::InsufficientBalance(InsufficientBalance {
            required: Money::from_cents(12_960),
            available: Money::from_cents(10_000),
            shortage: Money::from_cents(2_960),
        });
        assert_eq!(
            order_error_message(&err),
            "Insufficient balance. You need $29.60 more to place this order."
        );
        assert_eq!(order_error_message(&CheckoutServiceError::EmptyCart), "Cart is empty");
    }
}
