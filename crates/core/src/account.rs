//! Account form rules: sign-up validation, login form checks and the
//! password strength meter.

use serde::Deserialize;

use crate::types::Email;
use crate::validation::is_valid_username_chars;

/// Minimum username length in characters.
pub const MIN_USERNAME_LEN: usize = 3;
/// Minimum password length in characters.
pub const MIN_PASSWORD_LEN: usize = 6;
/// Minimum first/last name length in characters.
pub const MIN_NAME_LEN: usize = 2;

/// Why a sign-up form was rejected. The display text is shown to the shopper.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Username must be at least 3 characters long")]
    UsernameTooShort,
    #[error("Username can only contain letters, numbers, and underscores")]
    UsernameInvalidChars,
    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("First and last name must be at least 2 characters long")]
    NameTooShort,
}

/// Sign-up form as submitted.
///
/// `confirm_password` is optional so JSON clients may omit it; the page form
/// always sends it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

/// A sign-up form that passed every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl RegistrationForm {
    /// Check the form, reporting the first rule it breaks.
    ///
    /// Rules run in a fixed order: required fields, email shape, username
    /// length then characters, password length, confirmation, name lengths.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistrationError`] encountered.
    pub fn validate(&self) -> Result<NewAccount, RegistrationError> {
        let username = self.username.trim();
        let email = self.email.trim();
        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();

        for (label, value) in [
            ("username", username),
            ("email", email),
            ("first name", first_name),
            ("last name", last_name),
            ("password", self.password.as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(RegistrationError::Missing(label));
            }
        }

        let email = Email::parse(email).map_err(|_| RegistrationError::InvalidEmail)?;

        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(RegistrationError::UsernameTooShort);
        }
        if !is_valid_username_chars(username) {
            return Err(RegistrationError::UsernameInvalidChars);
        }

        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(RegistrationError::PasswordTooShort);
        }
        if let Some(confirm) = &self.confirm_password
            && *confirm != self.password
        {
            return Err(RegistrationError::PasswordMismatch);
        }

        if first_name.chars().count() < MIN_NAME_LEN || last_name.chars().count() < MIN_NAME_LEN {
            return Err(RegistrationError::NameTooShort);
        }

        Ok(NewAccount {
            username: username.to_owned(),
            email,
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            password: self.password.clone(),
        })
    }
}

/// Why a login form was rejected before any lookup.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginFormError {
    #[error("Please fill in all fields")]
    Missing,
    #[error("Please enter a valid email address")]
    InvalidEmail,
}

/// Login form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    /// Check presence and email shape.
    ///
    /// # Errors
    ///
    /// Returns [`LoginFormError`] when a field is blank or the email is malformed.
    pub fn validate(&self) -> Result<Email, LoginFormError> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(LoginFormError::Missing);
        }
        Email::parse(email).map_err(|_| LoginFormError::InvalidEmail)
    }
}

/// Password strength score out of five.
///
/// One point each for: length of at least 8, a lowercase letter, an
/// uppercase letter, a digit, and any other character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PasswordStrength(u8);

const STRENGTH_LABELS: [&str; 5] = ["Very Weak", "Weak", "Fair", "Good", "Strong"];
const STRENGTH_COLORS: [&str; 5] = ["#e74c3c", "#e67e22", "#f39c12", "#f1c40f", "#27ae60"];

impl PasswordStrength {
    /// Score a candidate password.
    #[must_use]
    pub fn of(password: &str) -> Self {
        let checks = [
            password.chars().count() >= 8,
            password.chars().any(|c| c.is_ascii_lowercase()),
            password.chars().any(|c| c.is_ascii_uppercase()),
            password.chars().any(|c| c.is_ascii_digit()),
            password.chars().any(|c| !c.is_ascii_alphanumeric()),
        ];
        #[allow(clippy::cast_possible_truncation)]
        let score = checks.iter().filter(|passed| **passed).count() as u8;
        Self(score)
    }

    /// Number of checks passed, 0 to 5.
    #[must_use]
    pub const fn score(self) -> u8 {
        self.0
    }

    /// Meter label. Zero and one both read "Very Weak".
    #[must_use]
    pub fn label(self) -> &'static str {
        STRENGTH_LABELS
            .get(usize::from(self.0.saturating_sub(1)))
            .copied()
            .unwrap_or("Very Weak")
    }

    /// Meter colour as a CSS hex string.
    #[must_use]
    pub fn color(self) -> &'static str {
        STRENGTH_COLORS
            .get(usize::from(self.0.saturating_sub(1)))
            .copied()
            .unwrap_or("#e74c3c")
    }

    /// Meter fill width in percent.
    #[must_use]
    pub const fn percent(self) -> u8 {
        self.0 * 20
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_form() -> RegistrationForm {
        RegistrationForm {
            username: "jane_doe".to_owned(),
            email: "jane@example.com".to_owned(),
            first_name: "Jane".to_owned(),
            last_name: "Doe".to_owned(),
            password: "secret1".to_owned(),
            confirm_password: Some("secret1".to_owned()),
        }
    }

    #[test]
    fn test_valid_registration() {
        let account = valid_form().validate().unwrap();
        assert_eq!(account.username, "jane_doe");
        assert_eq!(account.email.as_str(), "jane@example.com");
    }

    #[test]
    fn test_missing_fields_reported_in_form_order() {
        let form = RegistrationForm {
            username: String::new(),
            email: String::new(),
            ..valid_form()
        };
        assert_eq!(form.validate(), Err(RegistrationError::Missing("username")));

        let form = RegistrationForm {
            last_name: "  ".to_owned(),
            ..valid_form()
        };
        let err = form.validate().unwrap_err();
        assert_eq!(err.to_string(), "last name is required");
    }

    #[test]
    fn test_rule_order() {
        let bad_email = RegistrationForm {
            email: "jane@localhost".to_owned(),
            username: "x".to_owned(),
            ..valid_form()
        };
        assert_eq!(bad_email.validate(), Err(RegistrationError::InvalidEmail));

        let short = RegistrationForm {
            username: "jd".to_owned(),
            ..valid_form()
        };
        assert_eq!(short.validate(), Err(RegistrationError::UsernameTooShort));

        let dashed = RegistrationForm {
            username: "jane-doe".to_owned(),
            ..valid_form()
        };
        assert_eq!(dashed.validate(), Err(RegistrationError::UsernameInvalidChars));
    }

    #[test]
    fn test_password_rules() {
        let short = RegistrationForm {
            password: "abc".to_owned(),
            confirm_password: Some("abc".to_owned()),
            ..valid_form()
        };
        assert_eq!(short.validate(), Err(RegistrationError::PasswordTooShort));

        let mismatch = RegistrationForm {
            confirm_password: Some("secret2".to_owned()),
            ..valid_form()
        };
        assert_eq!(mismatch.validate(), Err(RegistrationError::PasswordMismatch));

        let no_confirm = RegistrationForm {
            confirm_password: None,
            ..valid_form()
        };
        assert!(no_confirm.validate().is_ok());
    }

    #[test]
    fn test_name_length() {
        let form = RegistrationForm {
            first_name: "J".to_owned(),
            ..valid_form()
        };
        assert_eq!(form.validate(), Err(RegistrationError::NameTooShort));
    }

    #[test]
    fn test_login_form() {
        let empty = LoginForm::default();
        assert_eq!(empty.validate(), Err(LoginFormError::Missing));

        let bad = LoginForm {
            email: "nope".to_owned(),
            password: "pw".to_owned(),
        };
        assert_eq!(bad.validate(), Err(LoginFormError::InvalidEmail));

        let ok = LoginForm {
            email: " jane@example.com ".to_owned(),
            password: "pw".to_owned(),
        };
        assert_eq!(ok.validate().unwrap().as_str(), "jane@example.com");
    }

    #[test]
    fn test_password_strength() {
        assert_eq!(PasswordStrength::of("").score(), 0);
        assert_eq!(PasswordStrength::of("").label(), "Very Weak");
        assert_eq!(PasswordStrength::of("abc").label(), "Very Weak");
        assert_eq!(PasswordStrength::of("abcABC").label(), "Weak");
        assert_eq!(PasswordStrength::of("abcABC12").label(), "Good");
        let strong = PasswordStrength::of("abcABC12!");
        assert_eq!(strong.score(), 5);
        assert_eq!(strong.label(), "Strong");
        assert_eq!(strong.color(), "#27ae60");
        assert_eq!(strong.percent(), 100);
    }
}
