//! Authentication route handlers.
//!
//! Handles password login, registration and logout for the HTML pages.
//! Signing in folds any guest cart into the shopper's stored cart.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use furnish_core::account::{LoginForm, RegistrationForm};

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::models::user::User;
use crate::services::auth::{AuthError, AuthService};
use crate::services::cart::{merge_guest_into_user, report_merge_failure};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginSubmission {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Where to go after signing in.
    pub next: Option<String>,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub email: String,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterTemplate {
    fn filled(form: &RegistrationForm, error: String) -> Self {
        Self {
            current_user: None,
            error: Some(error),
            username: form.username.clone(),
            email: form.email.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
        }
    }
}

/// Only local paths are accepted as post-login destinations.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

fn login_error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid email or password.",
        "missing" => "Email and password are required.",
        "session" => "We could not sign you in. Please try again.",
        "required" => "Please sign in to continue.",
        _ => "Something went wrong. Please try again.",
    }
}

fn login_success_message(code: &str) -> &'static str {
    match code {
        "logged_out" => "You have been signed out.",
        _ => "Done.",
    }
}

/// Store the shopper in the session and bring their guest cart along.
async fn sign_in(state: &AppState, session: &Session, user: &User) -> Result<(), Response> {
    if let Err(e) = merge_guest_into_user(state.pool(), session, user.id).await {
        report_merge_failure(user.id, &e);
    }

    if let Err(e) = set_current_user(session, &user.to_current_user()).await {
        tracing::error!("Failed to set session: {}", e);
        return Err(Redirect::to("/auth/login?error=session").into_response());
    }

    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if current_user.is_some() {
        return Redirect::to(safe_next(query.next.as_deref())).into_response();
    }

    LoginTemplate {
        current_user,
        error: query
            .error
            .as_deref()
            .map(|code| login_error_message(code).to_string()),
        success: query
            .success
            .as_deref()
            .map(|code| login_success_message(code).to_string()),
        email: String::new(),
        next: safe_next(query.next.as_deref()).to_string(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginSubmission>,
) -> Response {
    let next = safe_next(form.next.as_deref()).to_string();
    let credentials = LoginForm {
        email: form.email,
        password: form.password,
    };

    let auth = AuthService::new(state.pool(), state.config().shop.opening_balance);
    match auth.login(&credentials).await {
        Ok(user) => {
            if let Err(response) = sign_in(&state, &session, &user).await {
                return response;
            }
            tracing::info!(user_id = %user.id, "Shopper signed in");
            Redirect::to(&next).into_response()
        }
        Err(e @ (AuthError::Repository(_) | AuthError::PasswordHash)) => {
            tracing::error!("Login failed: {}", e);
            LoginTemplate {
                current_user: None,
                error: Some(login_error_message("unknown").to_string()),
                success: None,
                email: credentials.email,
                next,
            }
            .into_response()
        }
        Err(e) => {
            tracing::warn!("Login rejected: {}", e);
            let code = match e {
                AuthError::LoginForm(furnish_core::account::LoginFormError::Missing) => "missing",
                _ => "credentials",
            };
            LoginTemplate {
                current_user: None,
                error: Some(login_error_message(code).to_string()),
                success: None,
                email: credentials.email,
                next,
            }
            .into_response()
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<MessageQuery>,
) -> Response {
    if current_user.is_some() {
        return Redirect::to("/").into_response();
    }

    RegisterTemplate {
        current_user,
        error: query.error,
        username: String::new(),
        email: String::new(),
        first_name: String::new(),
        last_name: String::new(),
    }
    .into_response()
}

/// Handle registration form submission.
///
/// A new account starts with the configured opening balance and is signed
/// in straight away.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegistrationForm>,
) -> Response {
    let auth = AuthService::new(state.pool(), state.config().shop.opening_balance);
    match auth.register(&form).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Shopper registered");
            if let Err(response) = sign_in(&state, &session, &user).await {
                return response;
            }
            Redirect::to("/").into_response()
        }
        Err(e @ (AuthError::Repository(_) | AuthError::PasswordHash)) => {
            tracing::error!("Registration failed: {}", e);
            RegisterTemplate::filled(&form, "Registration failed. Please try again.".to_string())
                .into_response()
        }
        Err(e) => {
            tracing::warn!("Registration rejected: {}", e);
            RegisterTemplate::filled(&form, e.to_string()).into_response()
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    clear_sentry_user();

    Redirect::to("/auth/login?success=logged_out").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(Some("/checkout")), "/checkout");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn test_login_error_messages() {
        assert_eq!(login_error_message("credentials"), "Invalid email or password.");
        assert_eq!(
            login_error_message("nonsense"),
            "Something went wrong. Please try again."
        );
    }
}
