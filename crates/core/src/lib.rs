//! Furnish Core - Shared types and storefront rules.
//!
//! This crate provides the domain types and pure business rules used by:
//! - `storefront` - Public-facing furniture shop (pages + JSON API)
//! - `cli` - Command-line tools for migrations, seeding and balances
//!
//! # Architecture
//!
//! The core crate contains only types and rules - no I/O, no database access,
//! no HTTP clients. Anything that can be decided from values alone (cart
//! arithmetic, totals, promo codes, form validation, the room suggestion
//! generator) lives here so it can be tested without a server.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, and statuses
//! - [`cart`] - Cart lines, quantity rules and guest-cart merging
//! - [`pricing`] - Shipping, tax, discount and the balance gate
//! - [`promo`] - Promo code lookup
//! - [`checkout`] - Checkout wizard steps and form validation
//! - [`account`] - Registration validation and password strength
//! - [`room`] - Deterministic room-analysis suggestion generator

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod cart;
pub mod checkout;
pub mod pricing;
pub mod promo;
pub mod room;
pub mod types;
pub mod validation;

pub use types::*;
