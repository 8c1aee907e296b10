//! Authentication service.
//!
//! Password accounts for the page flow plus bearer tokens for the JSON API.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

use furnish_core::account::{LoginForm, RegistrationForm};
use furnish_core::{Money, UserId};

use crate::db::RepositoryError;
use crate::db::tokens::TokenRepository;
use crate::db::users::UserRepository;
use crate::models::user::User;

/// How long an API token stays valid.
pub const TOKEN_LIFETIME_HOURS: i64 = 24;

/// A freshly issued API bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct ApiToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Authentication service.
///
/// Handles sign-up, password login and API token lifecycle.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
    opening_balance: Money,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    ///
    /// New accounts start with `opening_balance` of store credit.
    #[must_use]
    pub const fn new(pool: &'a PgPool, opening_balance: Money) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
            opening_balance,
        }
    }

    /// Register a new account.
    ///
    /// The email is checked before the username so a shopper re-registering
    /// learns about the email first.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Registration` if the form breaks a rule.
    /// Returns `AuthError::EmailTaken` or `AuthError::UsernameTaken` if the
    /// account already exists.
    pub async fn register(&self, form: &RegistrationForm) -> Result<User, AuthError> {
        let account = form.validate()?;

        if self.users.get_by_email(&account.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }
        if self.users.username_taken(&account.username).await? {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = hash_password(&account.password)?;

        // A concurrent sign-up can still win the race; the unique constraints decide.
        self.users
            .create(&account, &password_hash, self.opening_balance)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(constraint) if constraint.contains("username") => {
                    AuthError::UsernameTaken
                }
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::LoginForm` if a field is blank or malformed.
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, form: &LoginForm) -> Result<User, AuthError> {
        let email = form.validate()?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&form.password, &password_hash)?;

        Ok(user)
    }

    /// Issue a bearer token for the API.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the token cannot be stored.
    pub async fn issue_token(&self, user_id: UserId) -> Result<ApiToken, AuthError> {
        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(TOKEN_LIFETIME_HOURS);

        self.tokens.create(user_id, &token, expires_at).await?;

        Ok(ApiToken { token, expires_at })
    }

    /// Resolve a bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown or expired.
    /// Returns `AuthError::UserNotFound` if the owning account is gone.
    pub async fn user_for_token(&self, token: &str) -> Result<User, AuthError> {
        let user_id = self
            .tokens
            .find_user(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.get_user(user_id).await
    }

    /// Revoke a bearer token. Unknown tokens are not an error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        if !self.tokens.delete(token).await? {
            tracing::debug!("Logout with unknown token");
        }
        Ok(())
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// 32 random bytes, hex encoded.
fn generate_token() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
