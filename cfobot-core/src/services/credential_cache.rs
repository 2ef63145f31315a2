//! Credential cache - expiry-aware, single-flight access token holder

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::domain::result::Result;
use crate::domain::Credential;
use crate::ports::TokenIssuer;

/// Default margin before expiry at which a credential is refreshed
pub const DEFAULT_SKEW: Duration = Duration::from_secs(60);

/// Longest lifetime accepted from the issuer; longer ones are clamped
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Process-wide holder of the ledger access credential
///
/// The slot is guarded by an async mutex that stays locked for the whole
/// refresh, so callers arriving during a refresh wait for it and then reuse
/// its result instead of firing their own.
pub struct CredentialCache {
    issuer: Arc<dyn TokenIssuer>,
    skew: Duration,
    slot: Mutex<Option<Credential>>,
    refreshes: AtomicU64,
}

impl CredentialCache {
    pub fn new(issuer: Arc<dyn TokenIssuer>, skew: Duration) -> Self {
        Self {
            issuer,
            skew,
            slot: Mutex::new(None),
            refreshes: AtomicU64::new(0),
        }
    }

    /// Get a credential, refreshing it first if it is missing or about to expire
    ///
    /// If the refresh fails but the cached credential expired less than
    /// `skew` ago it is served anyway and the ledger gets to reject it.
    pub async fn get_token(&self) -> Result<Credential> {
        let mut slot = self.slot.lock().await;

        if let Some(cred) = slot.as_ref() {
            if !cred.needs_refresh(Instant::now(), self.skew) {
                return Ok(cred.clone());
            }
        }

        match self.refresh_locked(&mut slot).await {
            Ok(cred) => Ok(cred),
            Err(e) => match slot.as_ref() {
                Some(stale) if stale.is_usable(Instant::now(), self.skew) => {
                    warn!("Token refresh failed, serving cached token: {}", e);
                    Ok(stale.clone())
                }
                _ => Err(e),
            },
        }
    }

    /// Force a refresh regardless of the cached credential's expiry
    pub async fn refresh_now(&self) -> Result<Credential> {
        let mut slot = self.slot.lock().await;
        self.refresh_locked(&mut slot).await
    }

    /// Drop the cached credential if it is still `token`
    ///
    /// Called after the ledger rejected `token`. When another caller already
    /// replaced it, the newer credential is kept.
    pub async fn invalidate(&self, token: &str) {
        let mut slot = self.slot.lock().await;
        if slot.as_ref().is_some_and(|c| c.token == token) {
            debug!("Invalidating rejected access token");
            *slot = None;
        }
    }

    /// Number of successful refreshes since creation
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    /// Start a background task that refreshes every `every`
    ///
    /// Keeps refreshes off the request path; `every` should be shorter than
    /// the token lifetime minus the skew.
    pub fn spawn_refresher(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let start = Instant::now().checked_add(every).unwrap_or_else(Instant::now);
            let mut ticker = tokio::time::interval_at(start, every);
            loop {
                ticker.tick().await;
                if let Err(e) = cache.refresh_now().await {
                    warn!("Background token refresh failed: {}", e);
                }
            }
        })
    }

    async fn refresh_locked(&self, slot: &mut Option<Credential>) -> Result<Credential> {
        debug!("Refreshing ledger access token");
        let issued = self.issuer.issue().await?;
        if issued.expires_in > MAX_TOKEN_LIFETIME {
            warn!(
                "Issuer reported a {}s token lifetime, clamping to {}s",
                issued.expires_in.as_secs(),
                MAX_TOKEN_LIFETIME.as_secs()
            );
        }
        let lifetime = issued.expires_in.min(MAX_TOKEN_LIFETIME);
        let cred = Credential::new(issued.access_token, Instant::now() + lifetime);

        *slot = Some(cred.clone());
        self.refreshes.fetch_add(1, Ordering::Relaxed);
        info!("Ledger access token refreshed (valid for {}s)", lifetime.as_secs());
        Ok(cred)
    }
}
