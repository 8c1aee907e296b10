//! Token authentication API.
//!
//! ```text
//! POST /api/auth/register  {username, email, first_name, last_name, password, confirm_password?}
//! POST /api/auth/login     {email, password} -> {success, message, user, token, expires_at}
//! POST /api/auth/logout    Authorization: Bearer <token>
//! GET  /api/auth/profile   Authorization: Bearer <token>
//! ```

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use furnish_core::account::{LoginForm, RegistrationForm};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{ApiUser, BearerToken, OptionalAuth, clear_current_user};
use crate::services::auth::AuthService;
use crate::services::cart::{merge_guest_into_user, report_merge_failure};
use crate::state::AppState;

/// Create an account.
///
/// POST /api/auth/register
///
/// # Errors
///
/// 400 on validation failure, 409 when the email or username is taken.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<Value>)> {
    let auth = AuthService::new(state.pool(), state.config().shop.opening_balance);
    let user = auth.register(&form).await?;
    tracing::info!(user_id = %user.id, "Shopper registered via API");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    ))
}

/// Exchange email and password for a bearer token.
///
/// POST /api/auth/login
///
/// A guest cart in the caller's session is merged into the user's cart.
///
/// # Errors
///
/// 400 when a field is missing, 401 for bad credentials.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<Value>> {
    let auth = AuthService::new(state.pool(), state.config().shop.opening_balance);
    let user = auth.login(&form).await?;
    let token = auth.issue_token(user.id).await?;

    if let Err(e) = merge_guest_into_user(state.pool(), &session, user.id).await {
        report_merge_failure(user.id, &e);
    }
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "user": user.profile(),
        "token": token.token,
        "expires_at": token.expires_at,
    })))
}

/// Revoke the caller's bearer token and clear any browser session.
///
/// POST /api/auth/logout
///
/// # Errors
///
/// 400 when no token is sent and nobody is signed in.
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(current_user): OptionalAuth,
    BearerToken(token): BearerToken,
) -> Result<Json<Value>> {
    match token {
        Some(token) => {
            AuthService::new(state.pool(), state.config().shop.opening_balance)
                .revoke_token(&token)
                .await?;
        }
        None if current_user.is_some() => {}
        None => return Err(AppError::BadRequest("Token required".to_string())),
    }

    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Json(json!({ "message": "Logout successful" })))
}

/// The caller's profile.
///
/// GET /api/auth/profile
///
/// # Errors
///
/// 401 without a valid token.
pub async fn profile(ApiUser(user): ApiUser) -> Json<Value> {
    Json(json!({ "user": user.profile() }))
}
