//! Domain models for storefront.
//!
//! Row types stay private to `db`; these are the validated shapes handed
//! to services, templates and JSON responses.

pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use order::{Order, OrderItem, OrderSummary, PlacedOrder};
pub use product::{Category, Product, ProductFilter};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{User, UserProfile};
