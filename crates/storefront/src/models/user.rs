//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use furnish_core::{Email, Money, UserId};

use super::CurrentUser;

/// A storefront shopper (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Unique public handle.
    pub username: String,
    /// User's email address.
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Spendable store balance.
    pub balance: Money,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// The identity kept in the browser session.
    #[must_use]
    pub fn to_current_user(&self) -> CurrentUser {
        CurrentUser {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            first_name: self.first_name.clone(),
        }
    }

    /// Public profile fields for JSON responses.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            balance: self.balance,
        }
    }
}

/// Profile returned by the login and profile endpoints.
///
/// Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub balance: Money,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            id: UserId::new(7),
            username: "sofa_fan".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: None,
            address: Some("12 Analytical Way".to_string()),
            balance: Money::from_cents(100_000),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_full_name() {
        assert_eq!(sample().full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_profile_json_shape() {
        let json = serde_json::to_value(sample().profile()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["username"], "sofa_fan");
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["balance"], "1000.00");
        assert!(json["phone"].is_null());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_current_user_copies_identity() {
        let current = sample().to_current_user();
        assert_eq!(current.id, UserId::new(7));
        assert_eq!(current.first_name, "Ada");
    }
}
