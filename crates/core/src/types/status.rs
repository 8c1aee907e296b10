//! Status and method enums stored as short text codes.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Paid from balance, not yet picked.
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The code stored in the `orders.status` column.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Human-readable label for order history.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// How the shopper says they will pay.
///
/// Payment is always settled from the account balance; the method is
/// recorded on the order for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    #[serde(rename = "paypal")]
    PayPal,
    #[serde(rename = "apple")]
    ApplePay,
}

impl PaymentMethod {
    /// All methods in the order the payment step lists them.
    pub const ALL: [Self; 3] = [Self::Card, Self::PayPal, Self::ApplePay];

    /// Form value and `orders.payment_method` column value.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::PayPal => "paypal",
            Self::ApplePay => "apple",
        }
    }

    /// Name shown on the review step.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Card => "Credit/Debit Card",
            Self::PayPal => "PayPal",
            Self::ApplePay => "Apple Pay",
        }
    }

    /// Whether the method needs card fields filled in.
    #[must_use]
    pub const fn requires_card(self) -> bool {
        matches!(self, Self::Card)
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "paypal" => Ok(Self::PayPal),
            "apple" => Ok(Self::ApplePay),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_codes_parse_back() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.code().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_method_names() {
        assert_eq!(PaymentMethod::Card.display_name(), "Credit/Debit Card");
        assert_eq!(PaymentMethod::PayPal.display_name(), "PayPal");
        assert_eq!(PaymentMethod::ApplePay.display_name(), "Apple Pay");
    }

    #[test]
    fn test_payment_method_serde_uses_form_codes() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::ApplePay).unwrap(),
            "\"apple\""
        );
        let parsed: PaymentMethod = serde_json::from_str("\"paypal\"").unwrap();
        assert_eq!(parsed, PaymentMethod::PayPal);
        assert!(PaymentMethod::Card.requires_card());
        assert!(!PaymentMethod::PayPal.requires_card());
    }
}
