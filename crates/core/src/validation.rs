//! Form field rules shared by the sign-up and checkout forms.
//!
//! Each `is_valid_*` function checks one field shape. [`FieldCheck`]
//! collects every failing field of a form step so the page can highlight
//! all of them at once.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::Email;

/// Letters, digits and underscores only.
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("Invalid regex"));

/// Optional leading `+`, then at least ten digits, spaces, dashes or parens.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[\d\s\-()]{10,}$").expect("Invalid regex"));

/// Sixteen digits in groups of four.
static CARD_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}\s\d{4}\s\d{4}\s\d{4}$").expect("Invalid regex"));

static CVV_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{3,4}$").expect("Invalid regex"));

/// `MM/YY` with a real month.
static EXPIRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0[1-9]|1[0-2])/\d{2}$").expect("Invalid regex"));

/// `something@something.something` with no whitespace.
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    Email::parse(value).is_ok()
}

#[must_use]
pub fn is_valid_username_chars(value: &str) -> bool {
    USERNAME_RE.is_match(value)
}

#[must_use]
pub fn is_valid_phone(value: &str) -> bool {
    PHONE_RE.is_match(value)
}

#[must_use]
pub fn is_valid_card_number(value: &str) -> bool {
    CARD_NUMBER_RE.is_match(value)
}

#[must_use]
pub fn is_valid_cvv(value: &str) -> bool {
    CVV_RE.is_match(value)
}

#[must_use]
pub fn is_valid_expiry(value: &str) -> bool {
    EXPIRY_RE.is_match(value)
}

/// A form step had one or more invalid fields.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Please fill in all required fields correctly.")]
pub struct ValidationError {
    /// Form field names that failed, in form order.
    pub fields: Vec<&'static str>,
}

impl ValidationError {
    /// Whether `field` is among the failing fields.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }
}

/// Accumulates failing fields for one form step.
#[derive(Debug, Default)]
pub struct FieldCheck {
    invalid: Vec<&'static str>,
}

impl FieldCheck {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            invalid: Vec::new(),
        }
    }

    /// Require a non-blank value. Returns the trimmed value when present.
    pub fn required<'v>(&mut self, field: &'static str, value: &'v str) -> Option<&'v str> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.flag(field);
            None
        } else {
            Some(trimmed)
        }
    }

    /// Require a non-blank value that also satisfies `rule`.
    pub fn required_with<'v>(
        &mut self,
        field: &'static str,
        value: &'v str,
        rule: fn(&str) -> bool,
    ) -> Option<&'v str> {
        let trimmed = self.required(field, value)?;
        if rule(trimmed) {
            Some(trimmed)
        } else {
            self.flag(field);
            None
        }
    }

    /// Mark a field as invalid.
    pub fn flag(&mut self, field: &'static str) {
        if !self.invalid.contains(&field) {
            self.invalid.push(field);
        }
    }

    /// `Ok(())` when nothing was flagged.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] listing every flagged field.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.invalid.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                fields: self.invalid,
            })
        }
    }
}
