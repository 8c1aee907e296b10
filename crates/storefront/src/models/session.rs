//! Session-related types.
//!
//! Types stored in the session for authentication and shopping state.

use serde::{Deserialize, Serialize};

use furnish_core::{Email, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in shopper.
/// Balance is never cached here; read it from `users` when needed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Public handle shown in the header.
    pub username: String,
    pub first_name: String,
}

/// Session keys for authentication and shopping data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the guest cart (a serialized `furnish_core::cart::Cart`).
    pub const GUEST_CART: &str = "guest_cart";

    /// Key for the checkout wizard progress.
    pub const CHECKOUT: &str = "checkout";
}
