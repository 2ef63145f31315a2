//! Ledger service port
//!
//! Defines the interface for issuing read-only queries against the external
//! accounting ledger (Zoho Books).

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::domain::result::Result;
use crate::domain::Entity;

/// Report and list endpoints used by the engine
pub mod endpoints {
    pub const CHART_OF_ACCOUNTS: &str = "chartofaccounts";
    pub const BANK_ACCOUNTS: &str = "bankaccounts";
    pub const BALANCE_SHEET: &str = "reports/balancesheet";
    pub const CASH_FLOW: &str = "reports/cashflow";
    pub const PROFIT_AND_LOSS: &str = "reports/profitandloss";
    pub const INVOICES: &str = "invoices";
}

/// Ledger service abstraction
///
/// Implementations compose the org-scoped URL, attach the credential and
/// classify the response. A returned tree is always a success; HTTP failures
/// and service-level error payloads are both `Error::LedgerApi`.
#[async_trait]
pub trait LedgerApi: Send + Sync {
    /// Query `endpoint` for `entity` with extra query parameters
    ///
    /// An empty response body comes back as `JsonValue::Null`.
    async fn call(
        &self,
        entity: &Entity,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<JsonValue>;
}
