//! Shopper balance management.
//!
//! Every account starts with the signup balance; operators use this to
//! top accounts up for demos and support cases.

use furnish_core::{Email, Money};
use furnish_storefront::db::{RepositoryError, UserRepository};

use super::{CommandError, connect};

/// Parse a dollar amount, rejecting negatives and sub-cent precision.
///
/// # Errors
///
/// Returns `CommandError::InvalidInput` for anything that is not a
/// non-negative amount with at most two decimal places.
pub fn parse_amount(amount: &str) -> Result<Money, CommandError> {
    let money: Money = amount
        .trim()
        .parse()
        .map_err(|_| CommandError::InvalidInput(format!("not an amount: {amount}")))?;

    if money < Money::ZERO {
        return Err(CommandError::InvalidInput(
            "balance cannot be negative".to_string(),
        ));
    }
    if money.round_cents() != money {
        return Err(CommandError::InvalidInput(
            "balance has more than two decimal places".to_string(),
        ));
    }
    Ok(money)
}

/// Overwrite the balance of the shopper with this email.
///
/// # Errors
///
/// Returns an error if the input is invalid, no such shopper exists or
/// the database is unreachable.
pub async fn set(email: &str, amount: &str) -> Result<(), CommandError> {
    let email = Email::parse(email).map_err(|e| CommandError::InvalidInput(e.to_string()))?;
    let balance = parse_amount(amount)?;

    let pool = connect().await?;
    let user = match UserRepository::new(&pool).set_balance(&email, balance).await {
        Ok(user) => user,
        Err(RepositoryError::NotFound) => {
            return Err(CommandError::InvalidInput(format!(
                "no shopper with email {email}"
            )));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        user_id = %user.id,
        email = %user.email,
        balance = %user.balance,
        "Balance updated"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("2500").unwrap(), Money::from_cents(250_000));
        assert_eq!(parse_amount(" 249.99 ").unwrap(), Money::from_cents(24_999));
    }

    #[test]
    fn test_parse_amount_rejects_bad_input() {
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("1.005").is_err());
        assert!(parse_amount("lots").is_err());
    }
}
