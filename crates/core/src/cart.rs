//! Shopping cart lines and quantity rules.
//!
//! The same [`Cart`] value backs the guest cart kept in the session and the
//! view of a signed-in user's cart loaded from the database, so totals and
//! merge behaviour are computed in one place.

use serde::{Deserialize, Serialize};

use crate::types::{Money, ProductId};

/// Errors from cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("only {available} in stock (requested {requested})")]
    OutOfStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// One product line in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    pub stock_quantity: u32,
    pub image_url: Option<String>,
    pub style: Option<String>,
    pub material: Option<String>,
}

impl CartItem {
    /// `price x quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.price.times(self.quantity)
    }
}

/// A line whose quantity changed during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedLine {
    pub product_id: ProductId,
    /// Quantity after the merge.
    pub quantity: u32,
    /// The guest quantity did not fit in stock and was reduced.
    pub capped: bool,
}

/// Quantity after adding `adding` to `existing`, never above `stock`.
#[must_use]
pub fn merged_quantity(existing: u32, adding: u32, stock: u32) -> u32 {
    existing.saturating_add(adding).min(stock)
}

/// An ordered set of cart lines, at most one per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from lines loaded elsewhere.
    #[must_use]
    pub const fn from_items(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of line subtotals.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    /// Add `line.quantity` units of a product.
    ///
    /// An existing line for the same product has its quantity increased and
    /// its price, stock and display fields refreshed from `line`.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] when `line.quantity` is zero
    /// - [`CartError::OutOfStock`] when the resulting quantity exceeds stock
    pub fn add(&mut self, line: CartItem) -> Result<u32, CartError> {
        if line.quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let existing = self.get(line.product_id).map_or(0, |i| i.quantity);
        let requested = existing.saturating_add(line.quantity);
        if requested > line.stock_quantity {
            return Err(CartError::OutOfStock {
                product_id: line.product_id,
                requested,
                available: line.stock_quantity,
            });
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == line.product_id) {
            *item = CartItem {
                quantity: requested,
                ..line
            };
        } else {
            self.items.push(line);
        }
        Ok(requested)
    }

    /// Set a line's quantity. Zero or below removes the line.
    ///
    /// Returns the new quantity, or `None` when the line was removed.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotInCart`] when the product has no line
    /// - [`CartError::OutOfStock`] when `quantity` exceeds stock
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Option<u32>, CartError> {
        let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) else {
            return Err(CartError::NotInCart(product_id));
        };

        if quantity <= 0 {
            self.remove(product_id);
            return Ok(None);
        }

        let requested = u32::try_from(quantity).unwrap_or(u32::MAX);
        if requested > item.stock_quantity {
            return Err(CartError::OutOfStock {
                product_id,
                requested,
                available: item.stock_quantity,
            });
        }
        item.quantity = requested;
        Ok(Some(requested))
    }

    /// Remove a product's line. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Fold another cart (typically the guest cart) into this one.
    ///
    /// Quantities accumulate per product and are capped at stock; lines with
    /// nothing in stock are dropped. Returns one entry per line that changed.
    pub fn merge(&mut self, other: Self) -> Vec<MergedLine> {
        let mut changed = Vec::new();

        for line in other.items {
            if line.quantity == 0 || line.stock_quantity == 0 {
                continue;
            }

            let existing = self.get(line.product_id).map_or(0, |i| i.quantity);
            let quantity = merged_quantity(existing, line.quantity, line.stock_quantity);
            if quantity == existing {
                continue;
            }
            let capped = quantity < existing.saturating_add(line.quantity);

            if let Some(item) = self.items.iter_mut().find(|i| i.product_id == line.product_id) {
                item.quantity = quantity;
                item.price = line.price;
                item.stock_quantity = line.stock_quantity;
            } else {
                self.items.push(CartItem { quantity, ..line });
            }

            changed.push(MergedLine {
                product_id: line.product_id,
                quantity,
                capped,
            });
        }

        changed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, cents: i64, quantity: u32, stock: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Money::from_cents(cents),
            quantity,
            stock_quantity: stock,
            image_url: None,
            style: Some("Modern".to_owned()),
            material: None,
        }
    }

    #[test]
    fn test_add_new_and_existing() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(line(1, 59_900, 1, 10)).unwrap(), 1);
        assert_eq!(cart.add(line(1, 59_900, 2, 10)).unwrap(), 3);
        assert_eq!(cart.add(line(2, 14_900, 1, 10)).unwrap(), 1);
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.count(), 4);
        assert_eq!(cart.subtotal(), Money::from_cents(59_900 * 3 + 14_900));
    }

    #[test]
    fn test_add_refreshes_price() {
        let mut cart = Cart::new();
        cart.add(line(1, 10_000, 1, 10)).unwrap();
        cart.add(line(1, 12_000, 1, 10)).unwrap();
        assert_eq!(cart.get(ProductId::new(1)).unwrap().price, Money::from_cents(12_000));
    }

    #[test]
    fn test_add_rejects_zero_and_overstock() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(line(1, 100, 0, 5)), Err(CartError::InvalidQuantity));
        cart.add(line(1, 100, 4, 5)).unwrap();
        assert_eq!(
            cart.add(line(1, 100, 2, 5)),
            Err(CartError::OutOfStock {
                product_id: ProductId::new(1),
                requested: 6,
                available: 5,
            })
        );
        assert_eq!(cart.count(), 4);
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = Cart::new();
        cart.add(line(1, 100, 1, 5)).unwrap();
        assert_eq!(cart.set_quantity(ProductId::new(1), 3).unwrap(), Some(3));
        assert!(matches!(
            cart.set_quantity(ProductId::new(1), 6),
            Err(CartError::OutOfStock { .. })
        ));
        assert_eq!(cart.set_quantity(ProductId::new(1), 0).unwrap(), None);
        assert!(cart.is_empty());
        assert_eq!(
            cart.set_quantity(ProductId::new(9), 1),
            Err(CartError::NotInCart(ProductId::new(9)))
        );
    }

    #[test]
    fn test_negative_quantity_removes() {
        let mut cart = Cart::new();
        cart.add(line(1, 100, 2, 5)).unwrap();
        assert_eq!(cart.set_quantity(ProductId::new(1), -1).unwrap(), None);
        assert_eq!(cart.count(), 0);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(line(1, 100, 1, 5)).unwrap();
        cart.add(line(2, 100, 1, 5)).unwrap();
        assert!(cart.remove(ProductId::new(1)));
        assert!(!cart.remove(ProductId::new(1)));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Money::ZERO);
    }

    #[test]
    fn test_merge_accumulates_and_caps() {
        let mut user = Cart::new();
        user.add(line(1, 100, 2, 5)).unwrap();

        let mut guest = Cart::new();
        guest.add(line(1, 100, 4, 5)).unwrap();
        guest.add(line(2, 200, 1, 3)).unwrap();

        let changed = user.merge(guest);
        assert_eq!(
            changed,
            vec![
                MergedLine {
                    product_id: ProductId::new(1),
                    quantity: 5,
                    capped: true,
                },
                MergedLine {
                    product_id: ProductId::new(2),
                    quantity: 1,
                    capped: false,
                },
            ]
        );
        assert_eq!(user.count(), 6);
    }

    #[test]
    fn test_merge_skips_sold_out_lines() {
        let mut user = Cart::new();
        let guest = Cart::from_items(vec![line(3, 100, 2, 0)]);
        assert!(user.merge(guest).is_empty());
        assert!(user.is_empty());
    }

    #[test]
    fn test_serde_round_trip_for_session() {
        let mut cart = Cart::new();
        cart.add(line(1, 1999, 2, 5)).unwrap();
        let json = serde_json::to_value(&cart).unwrap();
        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }
}
