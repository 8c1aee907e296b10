//! User repository for database operations.
//!
//! Shopper accounts and their balances. Runtime-checked queries map rows
//! through private row types so invalid data surfaces as
//! `RepositoryError::DataCorruption` instead of a panic.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use furnish_core::account::NewAccount;
use furnish_core::{Email, Money, UserId};

use super::RepositoryError;
use crate::models::user::User;

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, phone, address, \
                            balance, created_at";

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    address: Option<String>,
    balance: Money,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            username: row.username,
            email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            address: row.address,
            balance: row.balance,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user together with their password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((User::try_from(r.user)?, r.password_hash))),
            None => Ok(None),
        }
    }

    /// Whether a username is already registered (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn username_taken(&self, username: &str) -> Result<bool, RepositoryError> {
        let (taken,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE lower(username) = lower($1))")
                .bind(username)
                .fetch_one(self.pool)
                .await?;
        Ok(taken)
    }

    /// Create a new account with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` naming the violated constraint
    /// (`users_email_key` or `users_username_key`) when the account exists.
    pub async fn create(
        &self,
        account: &NewAccount,
        password_hash: &str,
        opening_balance: Money,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO users (username, email, password_hash, first_name, last_name, balance)
            VALUES ($1, lower($2), $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&account.username)
        .bind(account.email.as_str())
        .bind(password_hash)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(opening_balance)
        .fetch_one(self.pool)
        .await
        .map_err(RepositoryError::from_unique)?;

        User::try_from(row)
    }

    /// Current balance, read fresh.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn get_balance(&self, id: UserId) -> Result<Money, RepositoryError> {
        let row: Option<(Money,)> = sqlx::query_as("SELECT balance FROM users WHERE id = $1")
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        row.map(|(balance,)| balance).ok_or(RepositoryError::NotFound)
    }

    /// Overwrite a user's balance (operator tooling).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this email.
    pub async fn set_balance(&self, email: &Email, balance: Money) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            UPDATE users SET balance = $2, updated_at = NOW()
            WHERE lower(email) = lower($1)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(email.as_str())
        .bind(balance)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        User::try_from(row)
    }
}

/// Lock a user's balance row inside a checkout transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user does not exist.
pub async fn lock_balance(
    tx: &mut Transaction<'_, Postgres>,
    id: UserId,
) -> Result<Money, RepositoryError> {
    let row: Option<(Money,)> =
        sqlx::query_as("SELECT balance FROM users WHERE id = $1 FOR UPDATE")
            .bind(id.as_i32())
            .fetch_optional(&mut **tx)
            .await?;

    row.map(|(balance,)| balance).ok_or(RepositoryError::NotFound)
}

/// Write a new balance inside a checkout transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn store_balance(
    tx: &mut Transaction<'_, Postgres>,
    id: UserId,
    balance: Money,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE users SET balance = $2, updated_at = NOW() WHERE id = $1")
        .bind(id.as_i32())
        .bind(balance)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
