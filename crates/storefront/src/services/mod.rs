//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Sign-up, password login and API bearer tokens
//! - `cart` - Guest (session) and user (database) carts behind one API
//! - `catalog` - Product listings, categories and styles
//! - `checkout` - Transactional order placement
//! - `room` - Room photo checks and furniture suggestions
//!
//! Services borrow the pool (and session, where needed) for the length of
//! one request; handlers build them on demand.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod room;
