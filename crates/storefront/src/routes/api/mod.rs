//! JSON API.
//!
//! Handlers return [`crate::error::AppError`] on failure, which renders as
//! `{"error": "..."}` with a matching status code. Authenticated endpoints
//! accept `Authorization: Bearer <token>` or a signed-in browser session.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod products;
pub mod room;
