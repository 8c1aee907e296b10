//! Order totals and the balance gate.
//!
//! One [`PricingPolicy`] prices every view of a cart (sidebar, cart page,
//! checkout review, order placement) so the number shown to the shopper is
//! the number charged.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::Money;

/// Shipping and tax rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Orders whose discounted subtotal is strictly above this ship free.
    pub free_shipping_threshold: Money,
    /// Flat shipping charge below the threshold.
    pub shipping_rate: Money,
    /// Tax as a fraction of the discounted subtotal (0.08 = 8%).
    pub tax_rate: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Money::from_cents(10_000),
            shipping_rate: Money::from_cents(1999),
            tax_rate: Decimal::new(8, 2),
        }
    }
}

/// A priced cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    /// Sum of line subtotals before any discount.
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub tax: Money,
    /// `subtotal - discount + shipping + tax`.
    pub total: Money,
}

impl OrderTotals {
    /// Subtotal after the promo discount.
    #[must_use]
    pub fn discounted_subtotal(&self) -> Money {
        self.subtotal - self.discount
    }

    #[must_use]
    pub fn ships_free(&self) -> bool {
        self.shipping.is_zero()
    }
}

impl PricingPolicy {
    /// Shipping charge for a (discounted) subtotal. Nothing to ship costs nothing.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Money) -> Money {
        if subtotal.is_zero() || subtotal > self.free_shipping_threshold {
            Money::ZERO
        } else {
            self.shipping_rate
        }
    }

    /// Price a subtotal with an optional discount fraction.
    ///
    /// Discount and tax are each rounded to cents; shipping and tax are
    /// computed on the discounted subtotal.
    #[must_use]
    pub fn totals(&self, subtotal: Money, discount_rate: Option<Decimal>) -> OrderTotals {
        let subtotal = subtotal.round_cents();
        let discount = discount_rate
            .map_or(Money::ZERO, |rate| subtotal.scale(rate).round_cents())
            .min(subtotal);
        let discounted = subtotal - discount;
        let shipping = self.shipping_for(discounted);
        let tax = discounted.scale(self.tax_rate).round_cents();

        OrderTotals {
            subtotal,
            discount,
            shipping,
            tax,
            total: discounted + shipping + tax,
        }
    }

    /// Amount still needed before the free-shipping threshold is passed.
    #[must_use]
    pub fn remaining_for_free_shipping(&self, subtotal: Money) -> Option<Money> {
        if subtotal > self.free_shipping_threshold {
            None
        } else {
            Some(self.free_shipping_threshold - subtotal + Money::from_cents(1))
        }
    }
}

/// Balance does not cover the order.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[error("Insufficient balance")]
pub struct InsufficientBalance {
    pub required: Money,
    pub available: Money,
    pub shortage: Money,
}

/// Check that `balance` covers `total`.
///
/// # Errors
///
/// Returns [`InsufficientBalance`] with the shortage when `balance < total`.
pub fn ensure_affordable(balance: Money, total: Money) -> Result<(), InsufficientBalance> {
    if balance < total {
        Err(InsufficientBalance {
            required: total,
            available: balance,
            shortage: total - balance,
        })
    } else {
        Ok(())
    }
}

/// State of the checkout button in the cart views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutGate {
    /// Nothing to buy.
    EmptyCart,
    /// Guest shopper; the button leads to sign-in.
    LoginRequired,
    /// Signed in but the balance does not cover the total.
    InsufficientBalance { shortage: Money },
    Ready,
}

impl CheckoutGate {
    /// Decide the gate for a cart. `balance` is `None` for guests.
    #[must_use]
    pub fn evaluate(cart_is_empty: bool, balance: Option<Money>, total: Money) -> Self {
        if cart_is_empty {
            return Self::EmptyCart;
        }
        match balance {
            None => Self::LoginRequired,
            Some(balance) => match ensure_affordable(balance, total) {
                Ok(()) => Self::Ready,
                Err(e) => Self::InsufficientBalance {
                    shortage: e.shortage,
                },
            },
        }
    }

    /// Whether the button is clickable.
    #[must_use]
    pub const fn enabled(self) -> bool {
        matches!(self, Self::Ready | Self::LoginRequired)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InsufficientBalance { .. } => "Insufficient Balance",
            Self::EmptyCart | Self::LoginRequired | Self::Ready => "Checkout",
        }
    }

    /// Whether the balance panel should render in its "sufficient" style.
    #[must_use]
    pub const fn can_afford(self) -> bool {
        !matches!(self, Self::InsufficientBalance { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_small_order_pays_shipping() {
        let totals = PricingPolicy::default().totals(Money::from_cents(5000), None);
        assert_eq!(totals.shipping, Money::from_cents(1999));
        assert_eq!(totals.tax, Money::from_cents(400));
        assert_eq!(totals.total, Money::from_cents(5000 + 1999 + 400));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.shipping_for(Money::from_cents(10_000)), Money::from_cents(1999));
        assert_eq!(policy.shipping_for(Money::from_cents(10_001)), Money::ZERO);
    }

    #[test]
    fn test_empty_cart_costs_nothing() {
        let totals = PricingPolicy::default().totals(Money::ZERO, None);
        assert_eq!(totals.total, Money::ZERO);
    }

    #[test]
    fn test_discount_applies_before_shipping_and_tax() {
        // 110.00 ships free, but 20% off drops it to 88.00.
        let totals =
            PricingPolicy::default().totals(Money::from_cents(11_000), Some(Decimal::new(20, 2)));
        assert_eq!(totals.discount, Money::from_cents(2200));
        assert_eq!(totals.discounted_subtotal(), Money::from_cents(8800));
        assert_eq!(totals.shipping, Money::from_cents(1999));
        assert_eq!(totals.tax, Money::from_cents(704));
        assert_eq!(totals.total, Money::from_cents(8800 + 1999 + 704));
    }

    #[test]
    fn test_tax_rounds_to_cents() {
        // 8% of 12.34 is 0.9872
        let totals = PricingPolicy::default().totals(Money::from_cents(1234), None);
        assert_eq!(totals.tax, Money::from_cents(99));
    }

    #[test]
    fn test_custom_policy() {
        let policy = PricingPolicy {
            free_shipping_threshold: Money::from_cents(50_000),
            shipping_rate: Money::from_cents(2999),
            tax_rate: Decimal::new(8, 2),
        };
        assert_eq!(policy.totals(Money::from_cents(20_000), None).shipping, Money::from_cents(2999));
        assert!(policy.totals(Money::from_cents(60_000), None).ships_free());
    }

    #[test]
    fn test_remaining_for_free_shipping() {
        let policy = PricingPolicy::default();
        assert_eq!(
            policy.remaining_for_free_shipping(Money::from_cents(9000)),
            Some(Money::from_cents(1001))
        );
        assert_eq!(policy.remaining_for_free_shipping(Money::from_cents(20_000)), None);
    }

    #[test]
    fn test_ensure_affordable() {
        assert!(ensure_affordable(Money::from_cents(1000), Money::from_cents(1000)).is_ok());
        let err = ensure_affordable(Money::from_cents(500), Money::from_cents(1250)).unwrap_err();
        assert_eq!(err.required, Money::from_cents(1250));
        assert_eq!(err.available, Money::from_cents(500));
        assert_eq!(err.shortage, Money::from_cents(750));
    }

    #[test]
    fn test_checkout_gate() {
        let total = Money::from_cents(10_000);
        assert_eq!(CheckoutGate::evaluate(true, None, Money::ZERO), CheckoutGate::EmptyCart);
        assert_eq!(CheckoutGate::evaluate(false, None, total), CheckoutGate::LoginRequired);
        assert_eq!(
            CheckoutGate::evaluate(false, Some(Money::from_cents(10_000)), total),
            CheckoutGate::Ready
        );

        let gate = CheckoutGate::evaluate(false, Some(Money::from_cents(2500)), total);
        assert_eq!(
            gate,
            CheckoutGate::InsufficientBalance {
                shortage: Money::from_cents(7500)
            }
        );
        assert!(!gate.enabled());
        assert!(!gate.can_afford());
        assert_eq!(gate.label(), "Insufficient Balance");
        assert!(!CheckoutGate::EmptyCart.enabled());
        assert!(CheckoutGate::LoginRequired.enabled());
    }
}
