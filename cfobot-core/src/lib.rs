//! CFO bot core - financial aggregation engine
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Entity, Credential, LineItem, Query, etc.)
//! - **ports**: Trait definitions for external dependencies (LedgerApi, TokenIssuer)
//! - **services**: Business logic orchestration (credential cache, extraction, aging, replies)
//! - **adapters**: Concrete implementations (Zoho Accounts, Zoho Books)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;

use adapters::zoho_auth::ZohoOAuthIssuer;
use adapters::zoho_books::ZohoBooksClient;
use config::Config;
use services::{CredentialCache, FinanceService};

// Re-export commonly used types at crate root
pub use config::CashSource;
pub use domain::result::{Error, Result as CoreResult};
pub use domain::{
    AgingBucket, Credential, CurrencyFormat, Entity, EntityCode, EntityScope, Intent, LineItem,
    MonetaryTotal, Query,
};
pub use services::{AgingReport, EntityResult};

/// Main context for CFO bot operations
///
/// Wires configuration, the credential cache, the ledger client and the
/// finance service together. Must be created inside a tokio runtime when a
/// background refresh interval is configured.
pub struct CfoContext {
    pub config: Config,
    pub credentials: Arc<CredentialCache>,
    pub finance: FinanceService,
    refresher: Option<JoinHandle<()>>,
}

impl CfoContext {
    /// Create a context from `settings.json` in `config_dir` plus the environment
    pub fn new(config_dir: Option<&Path>) -> Result<Self> {
        let config = Config::load(config_dir)?;
        Self::from_config(config)
    }

    /// Create a context from an already loaded configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let issuer = ZohoOAuthIssuer::from_config(&config)
            .context("Failed to create Zoho OAuth client")?;
        let credentials = Arc::new(CredentialCache::new(Arc::new(issuer), config.token_skew));

        let ledger = ZohoBooksClient::from_config(&config, Arc::clone(&credentials))
            .context("Failed to create Zoho Books client")?;
        let finance = FinanceService::new(
            Arc::new(ledger),
            config.entities.clone(),
            config.cash_source,
        );

        let refresher = config
            .refresh_interval
            .map(|every| credentials.spawn_refresher(every));

        Ok(Self {
            config,
            credentials,
            finance,
            refresher,
        })
    }
}

impl Drop for CfoContext {
    fn drop(&mut self) {
        if let Some(handle) = self.refresher.take() {
            handle.abort();
        }
    }
}
