//! API token maintenance.

use furnish_storefront::db::TokenRepository;

use super::{CommandError, connect};

/// Delete bearer tokens past their expiry.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn purge() -> Result<(), CommandError> {
    let pool = connect().await?;

    let removed = TokenRepository::new(&pool).purge_expired().await?;
    tracing::info!(removed, "Expired tokens purged");
    Ok(())
}
