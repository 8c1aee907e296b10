//! The three-step checkout wizard: shipping, payment, review.
//!
//! [`CheckoutProgress`] is kept in the shopper's session between requests.
//! It only ever holds a [`PaymentSummary`]; full card numbers and CVVs are
//! validated and dropped.

use serde::{Deserialize, Serialize};

use crate::promo::{PromoCode, PromoError};
use crate::types::PaymentMethod;
use crate::validation::{
    FieldCheck, ValidationError, is_valid_card_number, is_valid_cvv, is_valid_email,
    is_valid_expiry, is_valid_phone,
};

/// Maximum length of a formatted card number (16 digits and 3 spaces).
pub const CARD_NUMBER_MAX_LEN: usize = 19;

/// Errors moving through the wizard.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Promo(#[from] PromoError),
    #[error("step {0} is not available yet")]
    StepLocked(u8),
    #[error("{0} details are missing")]
    Incomplete(&'static str),
}

/// A wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Payment,
    Review,
}

/// How a step renders in the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Completed,
    Active,
    Upcoming,
}

impl StepState {
    /// CSS class for the progress bar item.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Active => "active",
            Self::Upcoming => "",
        }
    }
}

impl CheckoutStep {
    pub const ALL: [Self; 3] = [Self::Shipping, Self::Payment, Self::Review];

    /// 1-based step number.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Shipping => 1,
            Self::Payment => 2,
            Self::Review => 3,
        }
    }

    #[must_use]
    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Shipping),
            2 => Some(Self::Payment),
            3 => Some(Self::Review),
            _ => None,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Shipping => "Shipping",
            Self::Payment => "Payment",
            Self::Review => "Review",
        }
    }

    /// The following step; the last step stays put.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Shipping => Self::Payment,
            Self::Payment | Self::Review => Self::Review,
        }
    }

    /// The preceding step; the first step stays put.
    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::Shipping | Self::Payment => Self::Shipping,
            Self::Review => Self::Payment,
        }
    }

    /// How `step` should render while `self` is current.
    #[must_use]
    pub fn state_of(self, step: Self) -> StepState {
        match step.cmp(&self) {
            std::cmp::Ordering::Less => StepState::Completed,
            std::cmp::Ordering::Equal => StepState::Active,
            std::cmp::Ordering::Greater => StepState::Upcoming,
        }
    }
}

/// Shipping step form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShippingForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// Validated shipping address. Also stored on the order as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl ShippingDetails {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// `City, ST 12345`
    #[must_use]
    pub fn locality_line(&self) -> String {
        format!("{}, {} {}", self.city, self.state, self.zip_code)
    }
}

impl ShippingForm {
    /// Every field is required; email and phone must also be well formed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming every invalid field.
    pub fn validate(&self) -> Result<ShippingDetails, ValidationError> {
        let mut check = FieldCheck::new();
        check.required("first_name", &self.first_name);
        check.required("last_name", &self.last_name);
        check.required_with("email", &self.email, is_valid_email);
        check.required_with("phone", &self.phone, is_valid_phone);
        check.required("address", &self.address);
        check.required("city", &self.city);
        check.required("state", &self.state);
        check.required("zip_code", &self.zip_code);
        check.required("country", &self.country);
        check.finish()?;

        let owned = |value: &str| value.trim().to_owned();
        Ok(ShippingDetails {
            first_name: owned(&self.first_name),
            last_name: owned(&self.last_name),
            email: owned(&self.email),
            phone: owned(&self.phone),
            address: owned(&self.address),
            city: owned(&self.city),
            state: owned(&self.state),
            zip_code: owned(&self.zip_code),
            country: owned(&self.country),
        })
    }
}

/// Payment step form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PaymentForm {
    /// `card`, `paypal` or `apple`. Blank means card.
    pub method: String,
    pub card_number: String,
    pub expiry_date: String,
    pub cvv: String,
    pub card_name: String,
}

/// What the review step and the order remember about payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub method: PaymentMethod,
    /// Last four digits for card payments.
    pub last4: Option<String>,
    pub card_name: Option<String>,
}

impl PaymentSummary {
    #[must_use]
    pub const fn method_name(&self) -> &'static str {
        self.method.display_name()
    }

    /// `**** **** **** 1234` for cards.
    #[must_use]
    pub fn masked_card(&self) -> Option<String> {
        self.last4.as_deref().map(|last4| format!("**** **** **** {last4}"))
    }
}

impl PaymentForm {
    /// Card payments need a 16-digit number, `MM/YY` expiry, 3-4 digit CVV
    /// and the cardholder name. Other methods need nothing further.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming every invalid field.
    pub fn validate(&self) -> Result<PaymentSummary, ValidationError> {
        let method = self.method.trim();
        let method = if method.is_empty() {
            PaymentMethod::Card
        } else {
            match method.parse::<PaymentMethod>() {
                Ok(method) => method,
                Err(_) => {
                    return Err(ValidationError {
                        fields: vec!["method"],
                    });
                }
            }
        };

        if !method.requires_card() {
            return Ok(PaymentSummary {
                method,
                last4: None,
                card_name: None,
            });
        }

        let card_number = format_card_number(&self.card_number);
        let expiry = format_expiry_date(&self.expiry_date);

        let mut check = FieldCheck::new();
        let number = check.required_with("card_number", &card_number, is_valid_card_number);
        check.required_with("expiry_date", &expiry, is_valid_expiry);
        check.required_with("cvv", &self.cvv, is_valid_cvv);
        let name = check.required("card_name", &self.card_name).map(str::to_owned);
        let last4 = number.map(last_four_digits);
        check.finish()?;

        Ok(PaymentSummary {
            method,
            last4,
            card_name: name,
        })
    }
}

fn last_four_digits(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(char::is_ascii_digit).collect();
    digits.iter().skip(digits.len().saturating_sub(4)).collect()
}

/// Group card digits in fours, dropping anything that is not a digit.
///
/// ```
/// use furnish_core::checkout::format_card_number;
///
/// assert_eq!(format_card_number("4242424242424242"), "4242 4242 4242 4242");
/// ```
#[must_use]
pub fn format_card_number(input: &str) -> String {
    let digits: Vec<char> = input.chars().filter(char::is_ascii_digit).collect();
    let grouped = digits
        .chunks(4)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ");
    grouped.chars().take(CARD_NUMBER_MAX_LEN).collect()
}

/// Turn typed digits into `MM/YY`.
///
/// ```
/// use furnish_core::checkout::format_expiry_date;
///
/// assert_eq!(format_expiry_date("1227"), "12/27");
/// assert_eq!(format_expiry_date("1"), "1");
/// ```
#[must_use]
pub fn format_expiry_date(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.len() < 2 {
        return digits;
    }
    let (month, rest) = digits.split_at(2);
    let year: String = rest.chars().take(2).collect();
    format!("{month}/{year}")
}

/// Wizard state carried between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutProgress {
    pub step: CheckoutStep,
    pub shipping: Option<ShippingDetails>,
    pub payment: Option<PaymentSummary>,
    pub promo: Option<PromoCode>,
}

impl CheckoutProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store the shipping step, then move to payment.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] when the form is invalid; the
    /// step does not change.
    pub fn submit_shipping(&mut self, form: &ShippingForm) -> Result<(), CheckoutError> {
        let details = form.validate()?;
        self.shipping = Some(details);
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Validate and store the payment step, then move to review.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Incomplete`] when shipping has not been submitted
    /// - [`CheckoutError::Validation`] when the form is invalid
    pub fn submit_payment(&mut self, form: &PaymentForm) -> Result<(), CheckoutError> {
        if self.shipping.is_none() {
            self.step = CheckoutStep::Shipping;
            return Err(CheckoutError::Incomplete("shipping"));
        }
        let summary = form.validate()?;
        self.payment = Some(summary);
        self.step = CheckoutStep::Review;
        Ok(())
    }

    /// Go back one step.
    pub fn back(&mut self) {
        self.step = self.step.prev();
    }

    /// Jump to an earlier (or the current) step to change it.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::StepLocked`] for steps after the current one.
    pub fn edit(&mut self, step: CheckoutStep) -> Result<(), CheckoutError> {
        if step > self.step {
            return Err(CheckoutError::StepLocked(step.number()));
        }
        self.step = step;
        Ok(())
    }

    /// Apply a promo code as typed.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Promo`]; an earlier code stays applied.
    pub fn apply_promo(&mut self, input: &str) -> Result<PromoCode, CheckoutError> {
        let code = PromoCode::parse(input)?;
        self.promo = Some(code);
        Ok(code)
    }

    /// Progress bar entries for every step.
    #[must_use]
    pub fn progress(&self) -> Vec<(CheckoutStep, StepState)> {
        CheckoutStep::ALL
            .iter()
            .map(|&s| (s, self.step.state_of(s)))
            .collect()
    }

    /// Shipping and payment, when both steps are done.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Incomplete`] naming the first missing step.
    pub fn ready(&self) -> Result<(&ShippingDetails, &PaymentSummary), CheckoutError> {
        let shipping = self
            .shipping
            .as_ref()
            .ok_or(CheckoutError::Incomplete("shipping"))?;
        let payment = self
            .payment
            .as_ref()
            .ok_or(CheckoutError::Incomplete("payment"))?;
        Ok((shipping, payment))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shipping_form() -> ShippingForm {
        ShippingForm {
            first_name: "Jane".to_owned(),
            last_name: "Doe".to_owned(),
            email: "jane@example.com".to_owned(),
            phone: "+1 (555) 123-4567".to_owned(),
            address: "1 Main St".to_owned(),
            city: "Austin".to_owned(),
            state: "TX".to_owned(),
            zip_code: "78701".to_owned(),
            country: "US".to_owned(),
        }
    }

    fn card_form() -> PaymentForm {
        PaymentForm {
            method: "card".to_owned(),
            card_number: "4242 4242 4242 1234".to_owned(),
            expiry_date: "12/27".to_owned(),
            cvv: "123".to_owned(),
            card_name: "Jane Doe".to_owned(),
        }
    }

    #[test]
    fn test_step_navigation() {
        assert_eq!(CheckoutStep::Shipping.next(), CheckoutStep::Payment);
        assert_eq!(CheckoutStep::Review.next(), CheckoutStep::Review);
        assert_eq!(CheckoutStep::Shipping.prev(), CheckoutStep::Shipping);
        assert_eq!(CheckoutStep::from_number(2), Some(CheckoutStep::Payment));
        assert_eq!(CheckoutStep::from_number(4), None);
    }

    #[test]
    fn test_shipping_validation_flags_every_bad_field() {
        let form = ShippingForm {
            email: "jane@".to_owned(),
            phone: "123".to_owned(),
            city: String::new(),
            ..shipping_form()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.fields, vec!["email", "phone", "city"]);
    }

    #[test]
    fn test_shipping_details_trimmed() {
        let form = ShippingForm {
            city: "  Austin ".to_owned(),
            ..shipping_form()
        };
        let details = form.validate().unwrap();
        assert_eq!(details.locality_line(), "Austin, TX 78701");
        assert_eq!(details.full_name(), "Jane Doe");
    }

    #[test]
    fn test_card_payment_keeps_only_last_four() {
        let summary = card_form().validate().unwrap();
        assert_eq!(summary.method, PaymentMethod::Card);
        assert_eq!(summary.masked_card().unwrap(), "**** **** **** 1234");
        assert_eq!(summary.method_name(), "Credit/Debit Card");
    }

    #[test]
    fn test_card_number_accepted_unformatted() {
        let form = PaymentForm {
            card_number: "4242424242424242".to_owned(),
            expiry_date: "1227".to_owned(),
            ..card_form()
        };
        assert_eq!(form.validate().unwrap().last4.as_deref(), Some("4242"));
    }

    #[test]
    fn test_card_payment_errors() {
        let form = PaymentForm {
            card_number: "4242 4242".to_owned(),
            cvv: "12".to_owned(),
            card_name: String::new(),
            ..card_form()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.fields, vec!["card_number", "cvv", "card_name"]);
    }

    #[test]
    fn test_non_card_methods_skip_card_fields() {
        let form = PaymentForm {
            method: "paypal".to_owned(),
            ..PaymentForm::default()
        };
        let summary = form.validate().unwrap();
        assert_eq!(summary.method_name(), "PayPal");
        assert_eq!(summary.masked_card(), None);

        let bad = PaymentForm {
            method: "bitcoin".to_owned(),
            ..PaymentForm::default()
        };
        assert_eq!(bad.validate().unwrap_err().fields, vec!["method"]);
    }

    #[test]
    fn test_formatters() {
        assert_eq!(format_card_number("4242-4242-4242-4242"), "4242 4242 4242 4242");
        assert_eq!(format_card_number("12345678901234567890"), "1234 5678 9012 3456");
        assert_eq!(format_card_number("42"), "42");
        assert_eq!(format_expiry_date("12/2027"), "12/20");
        assert_eq!(format_expiry_date("12"), "12/");
        assert_eq!(format_expiry_date(""), "");
    }

    #[test]
    fn test_wizard_flow() {
        let mut progress = CheckoutProgress::new();
        assert!(matches!(
            progress.submit_payment(&card_form()),
            Err(CheckoutError::Incomplete("shipping"))
        ));

        progress.submit_shipping(&shipping_form()).unwrap();
        assert_eq!(progress.step, CheckoutStep::Payment);
        assert_eq!(
            progress.progress(),
            vec![
                (CheckoutStep::Shipping, StepState::Completed),
                (CheckoutStep::Payment, StepState::Active),
                (CheckoutStep::Review, StepState::Upcoming),
            ]
        );

        progress.submit_payment(&card_form()).unwrap();
        assert_eq!(progress.step, CheckoutStep::Review);
        assert!(progress.ready().is_ok());

        progress.edit(CheckoutStep::Shipping).unwrap();
        assert_eq!(progress.step, CheckoutStep::Shipping);
        assert_eq!(
            progress.edit(CheckoutStep::Review),
            Err(CheckoutError::StepLocked(3))
        );
    }

    #[test]
    fn test_invalid_step_keeps_position() {
        let mut progress = CheckoutProgress::new();
        let bad = ShippingForm {
            zip_code: String::new(),
            ..shipping_form()
        };
        assert!(progress.submit_shipping(&bad).is_err());
        assert_eq!(progress.step, CheckoutStep::Shipping);
        assert!(progress.shipping.is_none());
    }

    #[test]
    fn test_promo_errors_keep_previous_code() {
        let mut progress = CheckoutProgress::new();
        progress.apply_promo("save10").unwrap();
        assert!(progress.apply_promo("nope").is_err());
        assert_eq!(progress.promo, Some(PromoCode::Save10));
    }

    #[test]
    fn test_back() {
        let mut progress = CheckoutProgress::new();
        progress.submit_shipping(&shipping_form()).unwrap();
        progress.back();
        assert_eq!(progress.step, CheckoutStep::Shipping);
    }
}
