//! Access credential for the ledger service

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// A short-lived OAuth access token and the instant it stops being valid
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at: Instant,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: Instant) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Whether the credential is inside its refresh window (`now >= expires_at - skew`)
    pub fn needs_refresh(&self, now: Instant, skew: Duration) -> bool {
        now.checked_add(skew)
            .map_or(true, |threshold| threshold >= self.expires_at)
    }

    /// Whether the credential may still be handed out when a refresh fails
    ///
    /// A credential that expired more than `skew` ago is never served.
    pub fn is_usable(&self, now: Instant, skew: Duration) -> bool {
        self.expires_at
            .checked_add(skew)
            .map_or(true, |limit| now < limit)
    }

    /// Time left until expiry (zero once expired)
    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Token as returned by the issuer, before it is anchored to an instant
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub access_token: String,
    /// Lifetime reported by the issuer
    pub expires_in: Duration,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
