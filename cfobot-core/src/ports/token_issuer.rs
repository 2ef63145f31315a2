//! Credential issuer port

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::IssuedToken;

/// Exchanges the long-lived refresh secret for a short-lived access token
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Perform one token exchange
    ///
    /// Fails with `Error::Auth` when the issuer rejects the request or
    /// answers without a token.
    async fn issue(&self) -> Result<IssuedToken>;
}
