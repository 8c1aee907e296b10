//! Promo codes accepted at checkout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Why a promo code was not applied. Display text is shown to the shopper.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PromoError {
    #[error("Please enter a promo code.")]
    Empty,
    #[error("Invalid promo code.")]
    Unknown,
}

/// A recognised promo code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromoCode {
    Save10,
    Welcome,
    First20,
}

impl PromoCode {
    /// Look up a code as typed. Surrounding whitespace and case are ignored.
    ///
    /// # Errors
    ///
    /// [`PromoError::Empty`] for blank input, [`PromoError::Unknown`] otherwise.
    pub fn parse(input: &str) -> Result<Self, PromoError> {
        let code = input.trim();
        if code.is_empty() {
            return Err(PromoError::Empty);
        }
        match code.to_ascii_uppercase().as_str() {
            "SAVE10" => Ok(Self::Save10),
            "WELCOME" => Ok(Self::Welcome),
            "FIRST20" => Ok(Self::First20),
            _ => Err(PromoError::Unknown),
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Save10 => "SAVE10",
            Self::Welcome => "WELCOME",
            Self::First20 => "FIRST20",
        }
    }

    /// Discount as a fraction of the subtotal.
    #[must_use]
    pub const fn rate(self) -> Decimal {
        Decimal::from_parts(self.percent(), 0, 0, false, 2)
    }

    /// Discount in whole percent.
    #[must_use]
    pub const fn percent(self) -> u32 {
        match self {
            Self::Save10 => 10,
            Self::Welcome => 15,
            Self::First20 => 20,
        }
    }

    /// Confirmation shown after the code is applied.
    #[must_use]
    pub fn applied_message(self) -> String {
        format!("Promo code applied! {}% discount.", self.percent())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(PromoCode::parse("SAVE10").unwrap().rate(), Decimal::new(10, 2));
        assert_eq!(PromoCode::parse("welcome").unwrap().rate(), Decimal::new(15, 2));
        assert_eq!(PromoCode::parse("  First20 ").unwrap(), PromoCode::First20);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(PromoCode::parse("   "), Err(PromoError::Empty));
        assert_eq!(PromoCode::parse("SAVE50"), Err(PromoError::Unknown));
        assert_eq!(PromoError::Empty.to_string(), "Please enter a promo code.");
        assert_eq!(PromoError::Unknown.to_string(), "Invalid promo code.");
    }

    #[test]
    fn test_applied_message() {
        assert_eq!(
            PromoCode::Welcome.applied_message(),
            "Promo code applied! 15% discount."
        );
    }
}
