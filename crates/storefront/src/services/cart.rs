//! Cart service.
//!
//! One entry point for both cart flavours: guests keep a [`Cart`] in their
//! session, signed-in shoppers keep lines in the `cart` table. Every
//! mutation goes through the core [`Cart`] rules first so quantity and
//! stock checks are identical for both.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use furnish_core::cart::{Cart, CartError, CartItem, MergedLine};
use furnish_core::pricing::{CheckoutGate, OrderTotals, PricingPolicy};
use furnish_core::{Money, ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::cart::CartRepository;
use crate::db::products::ProductRepository;
use crate::db::users::UserRepository;
use crate::error::add_breadcrumb;
use crate::models::{CurrentUser, session_keys};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartServiceError {
    #[error("Product not found")]
    ProductNotFound(ProductId),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Whose cart is being operated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOwner {
    Guest,
    User(UserId),
}

impl CartOwner {
    #[must_use]
    pub const fn user_id(self) -> Option<UserId> {
        match self {
            Self::Guest => None,
            Self::User(id) => Some(id),
        }
    }
}

impl From<Option<&CurrentUser>> for CartOwner {
    fn from(user: Option<&CurrentUser>) -> Self {
        user.map_or(Self::Guest, |u| Self::User(u.id))
    }
}

/// Everything the cart views render: lines, totals, balance and the
/// checkout button state.
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub count: u32,
    pub totals: OrderTotals,
    /// Fresh balance for signed-in shoppers.
    pub balance: Option<Money>,
    pub free_shipping_remaining: Option<Money>,
    #[serde(skip)]
    pub gate: CheckoutGate,
}

impl CartSummary {
    #[must_use]
    pub fn new(cart: Cart, balance: Option<Money>, pricing: &PricingPolicy) -> Self {
        let subtotal = cart.subtotal();
        let totals = pricing.totals(subtotal, None);
        let gate = CheckoutGate::evaluate(cart.is_empty(), balance, totals.total);

        Self {
            count: cart.count(),
            free_shipping_remaining: if cart.is_empty() {
                None
            } else {
                pricing.remaining_for_free_shipping(subtotal)
            },
            items: cart.into_items(),
            totals,
            balance,
            gate,
        }
    }

    /// Balance left after paying the total, if signed in.
    #[must_use]
    pub fn balance_after(&self) -> Option<Money> {
        self.balance.map(|b| b - self.totals.total)
    }
}

/// Cart service bound to one request.
pub struct CartService<'a> {
    pool: &'a PgPool,
    session: &'a Session,
    owner: CartOwner,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, session: &'a Session, owner: CartOwner) -> Self {
        Self {
            pool,
            session,
            owner,
        }
    }

    /// Load the current cart.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Session` or `CartServiceError::Repository`
    /// if the backing store fails.
    pub async fn load(&self) -> Result<Cart, CartServiceError> {
        match self.owner {
            CartOwner::Guest => load_guest_cart(self.session).await,
            CartOwner::User(user_id) => {
                let items = CartRepository::new(self.pool).items(user_id).await?;
                Ok(Cart::from_items(items))
            }
        }
    }

    /// Add `quantity` units of a product. Returns the line's new quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::ProductNotFound` for unknown or inactive
    /// products and `CartServiceError::Cart` when stock is exceeded.
    #[instrument(skip(self), fields(owner = ?self.owner))]
    pub async fn add(&self, product_id: ProductId, quantity: u32) -> Result<u32, CartServiceError> {
        let product = ProductRepository::new(self.pool)
            .get(product_id)
            .await?
            .ok_or(CartServiceError::ProductNotFound(product_id))?;

        let mut cart = self.load().await?;
        let new_quantity = cart.add(product.cart_line(quantity))?;

        match self.owner {
            CartOwner::Guest => store_guest_cart(self.session, &cart).await?,
            CartOwner::User(user_id) => {
                CartRepository::new(self.pool)
                    .set_quantity(user_id, product_id, new_quantity)
                    .await?;
            }
        }

        tracing::info!(%product_id, quantity = new_quantity, "Added to cart");
        Ok(new_quantity)
    }

    /// Add one unit of each product, skipping those that are missing or out
    /// of stock. Returns how many products were added.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Session` or `CartServiceError::Repository`
    /// if the backing store fails.
    #[instrument(skip(self), fields(owner = ?self.owner))]
    pub async fn add_many(&self, product_ids: &[ProductId]) -> Result<usize, CartServiceError> {
        let mut added = 0;
        for &product_id in product_ids {
            match self.add(product_id, 1).await {
                Ok(_) => added += 1,
                Err(CartServiceError::ProductNotFound(_) | CartServiceError::Cart(_)) => {
                    tracing::debug!(%product_id, "Skipped suggestion product");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(added)
    }

    /// Set a line's quantity; zero or below removes it. Returns the new
    /// quantity or `None` when removed.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Cart` when the product is not in the cart
    /// or the quantity exceeds stock.
    #[instrument(skip(self), fields(owner = ?self.owner))]
    pub async fn update(
        &self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Option<u32>, CartServiceError> {
        let mut cart = self.load().await?;
        let updated = cart.set_quantity(product_id, quantity)?;

        match self.owner {
            CartOwner::Guest => store_guest_cart(self.session, &cart).await?,
            CartOwner::User(user_id) => {
                let repo = CartRepository::new(self.pool);
                match updated {
                    Some(q) => repo.set_quantity(user_id, product_id, q).await?,
                    None => {
                        repo.remove(user_id, product_id).await?;
                    }
                }
            }
        }

        Ok(updated)
    }

    /// Remove a product's line. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Session` or `CartServiceError::Repository`
    /// if the backing store fails.
    #[instrument(skip(self), fields(owner = ?self.owner))]
    pub async fn remove(&self, product_id: ProductId) -> Result<bool, CartServiceError> {
        match self.owner {
            CartOwner::Guest => {
                let mut cart = load_guest_cart(self.session).await?;
                let removed = cart.remove(product_id);
                store_guest_cart(self.session, &cart).await?;
                Ok(removed)
            }
            CartOwner::User(user_id) => Ok(CartRepository::new(self.pool)
                .remove(user_id, product_id)
                .await?),
        }
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Session` or `CartServiceError::Repository`
    /// if the backing store fails.
    pub async fn clear(&self) -> Result<(), CartServiceError> {
        match self.owner {
            CartOwner::Guest => {
                self.session.remove::<Cart>(session_keys::GUEST_CART).await?;
            }
            CartOwner::User(user_id) => CartRepository::new(self.pool).clear(user_id).await?,
        }
        Ok(())
    }

    /// Sum of quantities.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub async fn count(&self) -> Result<u32, CartServiceError> {
        Ok(self.load().await?.count())
    }

    /// Sum of line subtotals.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub async fn total(&self) -> Result<Money, CartServiceError> {
        Ok(self.load().await?.subtotal())
    }

    /// Cart with totals, a freshly read balance and the checkout gate.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub async fn summary(&self, pricing: &PricingPolicy) -> Result<CartSummary, CartServiceError> {
        let cart = self.load().await?;
        let balance = match self.owner {
            CartOwner::Guest => None,
            CartOwner::User(user_id) => {
                Some(UserRepository::new(self.pool).get_balance(user_id).await?)
            }
        };
        Ok(CartSummary::new(cart, balance, pricing))
    }
}

/// Fold the session's guest cart into a user's stored cart, then drop it.
///
/// Guest lines are refreshed against current product data first so
/// inactive products vanish and stock caps use live numbers.
///
/// # Errors
///
/// Returns `CartServiceError::Session` or `CartServiceError::Repository`
/// if the backing store fails.
#[instrument(skip(pool, session))]
pub async fn merge_guest_into_user(
    pool: &PgPool,
    session: &Session,
    user_id: UserId,
) -> Result<Vec<MergedLine>, CartServiceError> {
    let guest = load_guest_cart(session).await?;
    if guest.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<ProductId> = guest.items().iter().map(|i| i.product_id).collect();
    let live = ProductRepository::new(pool).get_many(&ids).await?;
    let refreshed = Cart::from_items(
        live.iter()
            .filter_map(|p| guest.get(p.id).map(|line| p.cart_line(line.quantity)))
            .collect(),
    );

    let repo = CartRepository::new(pool);
    let mut cart = Cart::from_items(repo.items(user_id).await?);
    let changed = cart.merge(refreshed);

    for line in &changed {
        repo.set_quantity(user_id, line.product_id, line.quantity)
            .await?;
    }

    session.remove::<Cart>(session_keys::GUEST_CART).await?;
    tracing::info!(merged = changed.len(), "Merged guest cart");
    Ok(changed)
}

/// Record a failed guest cart merge. Signing in still succeeds and the
/// guest cart stays in the session.
pub fn report_merge_failure(user_id: UserId, err: &CartServiceError) {
    tracing::warn!(user_id = %user_id, "Failed to merge guest cart: {}", err);
    let id = user_id.to_string();
    let reason = err.to_string();
    add_breadcrumb(
        "cart",
        "Guest cart merge failed",
        Some(&[("user_id", id.as_str()), ("error", reason.as_str())]),
    );
}

async fn load_guest_cart(session: &Session) -> Result<Cart, CartServiceError> {
    Ok(session
        .get::<Cart>(session_keys::GUEST_CART)
        .await?
        .unwrap_or_default())
}

async fn store_guest_cart(session: &Session, cart: &Cart) -> Result<(), CartServiceError> {
    if cart.is_empty() {
        session.remove::<Cart>(session_keys::GUEST_CART).await?;
    } else {
        session.insert(session_keys::GUEST_CART, cart).await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_report_merge_failure_leaves_breadcrumb() {
        let events = sentry::test::with_captured_events(|| {
            let err = CartServiceError::ProductNotFound(ProductId::new(7));
            report_merge_failure(UserId::new(42), &err);
            sentry::capture_message("sign in", sentry::Level::Info);
        });

        let crumbs = &events[0].breadcrumbs;
        let crumb = crumbs
            .iter()
            .find(|b| b.message.as_deref() == Some("Guest cart merge failed"))
            .unwrap();
        assert_eq!(crumb.category.as_deref(), Some("cart"));
        assert_eq!(crumb.data["user_id"], "42");
        assert_eq!(crumb.data["error"], "Product not found");
    }

    fn line(id: i32, cents: i64, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Chair {id}"),
            price: Money::from_cents(cents),
            quantity,
            stock_quantity: 10,
            image_url: None,
            style: None,
            material: None,
        }
    }

    #[test]
    fn test_empty_summary_has_zero_totals() {
        let summary = CartSummary::new(Cart::new(), None, &PricingPolicy::default());
        assert_eq!(summary.count, 0);
        assert_eq!(summary.totals.total, Money::ZERO);
        assert_eq!(summary.gate, CheckoutGate::EmptyCart);
        assert!(summary.free_shipping_remaining.is_none());
    }

    #[test]
    fn test_guest_summary_requires_login() {
        let cart = Cart::from_items(vec![line(1, 5_000, 1)]);
        let summary = CartSummary::new(cart, None, &PricingPolicy::default());
        assert_eq!(summary.gate, CheckoutGate::LoginRequired);
        assert!(summary.balance_after().is_none());
    }

    #[test]
    fn test_summary_blocks_when_balance_short() {
        // 2 x 60.00 = 120.00, free shipping, 9.60 tax
        let cart = Cart::from_items(vec![line(1, 6_000, 2)]);
        let summary =
            CartSummary::new(cart, Some(Money::from_cents(10_000)), &PricingPolicy::default());
        assert_eq!(summary.totals.total, Money::from_cents(12_960));
        assert_eq!(
            summary.gate,
            CheckoutGate::InsufficientBalance {
                shortage: Money::from_cents(2_960)
            }
        );
        assert_eq!(summary.balance_after(), Some(Money::from_cents(-2_960)));
    }

    #[test]
    fn test_summary_reports_free_shipping_gap() {
        let cart = Cart::from_items(vec![line(1, 4_000, 1)]);
        let summary =
            CartSummary::new(cart, Some(Money::from_cents(100_000)), &PricingPolicy::default());
        assert_eq!(summary.gate, CheckoutGate::Ready);
        assert!(summary.free_shipping_remaining.is_some());
    }
}
