//! Order placement.
//!
//! The whole purchase is one transaction: the cart rows, the product rows
//! and the user's balance row are locked, totals are recomputed from locked
//! prices, and stock, order, balance and cart are written before commit.
//! Nothing the client sent is trusted except the addresses, payment method
//! and promo code.

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use furnish_core::checkout::ShippingDetails;
use furnish_core::pricing::{InsufficientBalance, PricingPolicy, ensure_affordable};
use furnish_core::promo::PromoCode;
use furnish_core::{Money, PaymentMethod, ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::cart::{self, CartLine};
use crate::db::orders::{self, NewOrder};
use crate::db::products::{self, LockedStock};
use crate::db::users;
use crate::models::order::{PlacedOrder, order_number};

/// Errors from order placement.
#[derive(Debug, Error)]
pub enum CheckoutServiceError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error(transparent)]
    InsufficientBalance(#[from] InsufficientBalance),

    #[error(
        "Insufficient stock for product ID {product_id}. Available: {available}, Requested: {requested}"
    )]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    #[error("An order was just placed, please try again")]
    DuplicateOrder,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutServiceError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// What the shopper submitted to place an order.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub shipping_address: ShippingDetails,
    /// Defaults to the shipping address.
    pub billing_address: Option<ShippingDetails>,
    pub payment_method: PaymentMethod,
    pub promo: Option<PromoCode>,
}

/// A cart line priced from its locked product row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PricedLine {
    product_id: ProductId,
    quantity: u32,
    price: Money,
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    pricing: PricingPolicy,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, pricing: PricingPolicy) -> Self {
        Self { pool, pricing }
    }

    /// Place an order for everything in the user's cart.
    ///
    /// # Errors
    ///
    /// - `CheckoutServiceError::EmptyCart` when there is nothing to buy
    /// - `CheckoutServiceError::InsufficientBalance` when the balance does
    ///   not cover the total
    /// - `CheckoutServiceError::InsufficientStock` when a line exceeds stock
    ///
    /// Any error rolls the transaction back.
    #[instrument(skip(self, request), fields(promo = ?request.promo))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: &OrderRequest,
    ) -> Result<PlacedOrder, CheckoutServiceError> {
        let mut tx = self.pool.begin().await?;

        let lines = cart::lines_for_update(&mut tx, user_id).await?;
        let ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
        let locked = products::lock_stock(&mut tx, &ids).await?;

        let lines = purchasable_lines(lines, &locked);
        if lines.is_empty() {
            return Err(CheckoutServiceError::EmptyCart);
        }

        let subtotal: Money = lines
            .iter()
            .filter_map(|line| {
                locked
                    .iter()
                    .find(|p| p.id == line.product_id.as_i32())
                    .map(|p| p.price.times(line.quantity))
            })
            .sum();
        let totals = self
            .pricing
            .totals(subtotal, request.promo.map(PromoCode::rate));

        let balance = users::lock_balance(&mut tx, user_id).await?;
        ensure_affordable(balance, totals.total)?;

        let priced = check_stock(&lines, &locked)?;

        let placed_at = Utc::now();
        let number = order_number(placed_at, user_id);
        let billing = request
            .billing_address
            .as_ref()
            .unwrap_or(&request.shipping_address);

        let order_id = orders::insert_order(
            &mut tx,
            &NewOrder {
                order_number: &number,
                user_id,
                totals: &totals,
                shipping_address: &request.shipping_address,
                billing_address: billing,
                payment_method: request.payment_method,
                created_at: placed_at,
            },
        )
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => CheckoutServiceError::DuplicateOrder,
            other => other.into(),
        })?;

        for line in &priced {
            products::decrement_stock(&mut tx, line.product_id, line.quantity).await?;
            orders::insert_item(&mut tx, order_id, line.product_id, line.quantity, line.price)
                .await?;
        }

        let new_balance = balance - totals.total;
        users::store_balance(&mut tx, user_id, new_balance).await?;
        cart::clear_in(&mut tx, user_id).await?;

        tx.commit().await?;

        tracing::info!(
            %order_id,
            order_number = %number,
            total = %totals.total,
            "Order placed"
        );

        Ok(PlacedOrder {
            order_id,
            order_number: number,
            totals,
            new_balance,
        })
    }
}

/// Keep the cart lines the cart view shows: products that still exist and
/// are active. Hidden lines are not bought and go away with the cart.
fn purchasable_lines(lines: Vec<CartLine>, locked: &[LockedStock]) -> Vec<CartLine> {
    lines
        .into_iter()
        .filter(|line| {
            locked
                .iter()
                .any(|p| p.id == line.product_id.as_i32() && p.is_active)
        })
        .collect()
}

/// Match cart lines to locked product rows and check stock.
///
/// A product that vanished or was deactivated counts as zero stock.
fn check_stock(
    lines: &[CartLine],
    locked: &[LockedStock],
) -> Result<Vec<PricedLine>, CheckoutServiceError> {
    lines
        .iter()
        .map(|line| {
            let product = locked
                .iter()
                .find(|p| p.id == line.product_id.as_i32() && p.is_active);
            let available = product
                .map_or(0, |p| u32::try_from(p.stock_quantity).unwrap_or(0));

            match product {
                Some(p) if line.quantity <= available => Ok(PricedLine {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    price: p.price,
                }),
                _ => Err(CheckoutServiceError::InsufficientStock {
                    product_id: line.product_id,
                    available,
                    requested: line.quantity,
                }),
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stock(id: i32, cents: i64, stock_quantity: i32, is_active: bool) -> LockedStock {
        LockedStock {
            id,
            name: format!("Sofa {id}"),
            price: Money::from_cents(cents),
            stock_quantity,
            is_active,
        }
    }

    fn line(id: i32, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            quantity,
        }
    }

    #[test]
    fn test_check_stock_prices_lines() {
        let priced =
            check_stock(&[line(1, 2), line(2, 1)], &[stock(1, 1_500, 5, true), stock(2, 900, 1, true)])
                .unwrap();
        assert_eq!(priced.len(), 2);
        assert_eq!(priced[0].price, Money::from_cents(1_500));
        assert_eq!(priced[1].quantity, 1);
    }

    #[test]
    fn test_check_stock_rejects_overdraw() {
        let err = check_stock(&[line(7, 3)], &[stock(7, 1_000, 2, true)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product ID 7. Available: 2, Requested: 3"
        );
    }

    #[test]
    fn test_purchasable_lines_skips_hidden_products() {
        let locked = [stock(1, 1_000, 5, true), stock(2, 2_000, 0, false)];
        let lines = purchasable_lines(vec![line(1, 1), line(2, 1), line(9, 1)], &locked);

        assert_eq!(lines, vec![line(1, 1)]);
        assert!(check_stock(&lines, &locked).is_ok());
    }

    #[test]
    fn test_purchasable_lines_empty_when_everything_hidden() {
        let locked = [stock(2, 2_000, 3, false)];
        assert!(purchasable_lines(vec![line(2, 1)], &locked).is_empty());
    }

    #[test]
    fn test_check_stock_treats_inactive_as_empty() {
        let err = check_stock(&[line(3, 1)], &[stock(3, 1_000, 10, false)]).unwrap_err();
        assert!(matches!(
            err,
            CheckoutServiceError::InsufficientStock { available: 0, .. }
        ));

        let err = check_stock(&[line(4, 1)], &[]).unwrap_err();
        assert!(matches!(
            err,
            CheckoutServiceError::InsufficientStock { available: 0, .. }
        ));
    }
}
