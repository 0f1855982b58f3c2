//! TokenStore trait definition.

use super::models::AuthToken;
use anyhow::Result;

/// Storage for the single OAuth credential.
pub trait TokenStore: Send + Sync {
    /// Replace whatever credential is stored with `token`. Deleting the old
    /// rows and inserting the new one happen in the same transaction, so
    /// readers never observe zero or two credentials.
    fn replace(&self, token: &AuthToken) -> Result<()>;

    /// The stored credential, or None if login never completed.
    fn get(&self) -> Result<Option<AuthToken>>;
}
