//! Configuration management
//!
//! Settings come from an optional `settings.json` in the config directory,
//! overridden by environment variables (the way the bot is deployed):
//! ```json
//! {
//!   "zoho": { "clientId": "...", "apiBase": "https://books.zoho.com/api/v3" },
//!   "entities": [ { "code": "kk", "orgId": "9001" }, { "code": "pt", "orgId": "9002" } ],
//!   "cashSource": "bank_accounts"
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::result::Error;
use crate::domain::{CurrencyFormat, Entity, EntityCode};
use crate::services::extract::TotalReport;

/// Zoho Books API (global data centre)
pub const DEFAULT_API_BASE: &str = "https://books.zoho.com/api/v3";

/// Zoho Books API (Japan data centre), where the KK books live
pub const JAPAN_API_BASE: &str = "https://books.zoho.jp/api/v3";

/// Zoho Accounts, the OAuth token issuer
pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.zoho.com";

const DEFAULT_TOKEN_SKEW_SECS: u64 = 60;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

/// Which report answers "cash balance"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashSource {
    ChartOfAccounts,
    #[default]
    BankAccounts,
    BalanceSheet,
    CashFlow,
}

impl CashSource {
    pub fn report(&self) -> TotalReport {
        match self {
            CashSource::ChartOfAccounts => TotalReport::AccountList,
            CashSource::BankAccounts => TotalReport::BankAccounts,
            CashSource::BalanceSheet => TotalReport::BalanceSheet,
            CashSource::CashFlow => TotalReport::CashFlow,
        }
    }

    /// Whether the source only knows today's balance (no as-of date)
    pub fn is_current_only(&self) -> bool {
        matches!(self, CashSource::ChartOfAccounts | CashSource::BankAccounts)
    }
}

impl FromStr for CashSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "chart_of_accounts" | "chartofaccounts" | "accounts" => Ok(CashSource::ChartOfAccounts),
            "bank_accounts" | "bankaccounts" | "bank" => Ok(CashSource::BankAccounts),
            "balance_sheet" | "balancesheet" => Ok(CashSource::BalanceSheet),
            "cash_flow" | "cashflow" => Ok(CashSource::CashFlow),
            other => Err(format!("unknown cash source '{}'", other)),
        }
    }
}

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    zoho: ZohoSettings,
    #[serde(default)]
    entities: Vec<EntitySettings>,
    #[serde(default)]
    cash_source: Option<CashSource>,
    #[serde(default)]
    token_skew_secs: Option<u64>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    refresh_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZohoSettings {
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    api_base: Option<String>,
    #[serde(default)]
    accounts_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntitySettings {
    code: EntityCode,
    #[serde(default)]
    org_id: String,
    #[serde(default)]
    api_base: Option<String>,
    #[serde(default)]
    currency: Option<CurrencyFormat>,
}

impl SettingsFile {
    fn read(dir: &Path) -> Result<Self> {
        let path = dir.join("settings.json");
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid {}", path.display()))
    }
}

/// Engine configuration
#[derive(Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Default ledger API base; entities may override it
    pub api_base: String,
    pub accounts_url: String,
    /// Entities in presentation order
    pub entities: Vec<Entity>,
    pub cash_source: CashSource,
    pub token_skew: Duration,
    pub request_timeout: Duration,
    /// Cadence of the optional background token refresher
    pub refresh_interval: Option<Duration>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("accounts_url", &self.accounts_url)
            .field("entities", &self.entities)
            .field("cash_source", &self.cash_source)
            .field("token_skew", &self.token_skew)
            .field("request_timeout", &self.request_timeout)
            .field("refresh_interval", &self.refresh_interval)
            .finish()
    }
}

impl Config {
    /// Load config from `settings.json` in `dir` (if given) and the environment
    ///
    /// Environment variables win over the file.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let file = match dir {
            Some(dir) => SettingsFile::read(dir)?,
            None => SettingsFile::default(),
        };
        let config = Self::from_sources(file, |name| {
            std::env::var(name).ok().filter(|v| !v.trim().is_empty())
        })?;
        config.validate()?;
        Ok(config)
    }

    fn from_sources<F>(file: SettingsFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |var: &str, fallback: Option<String>| env(var).or(fallback).unwrap_or_default();

        let parse_secs = |var: &str, fallback: Option<u64>| -> Result<Option<u64>> {
            match env(var) {
                Some(v) => v
                    .trim()
                    .parse::<u64>()
                    .map(Some)
                    .with_context(|| format!("{} must be a number of seconds", var)),
                None => Ok(fallback),
            }
        };

        let cash_source = match env("CFOBOT_CASH_SOURCE") {
            Some(v) => v.parse::<CashSource>().map_err(Error::config)?,
            None => file.cash_source.unwrap_or_default(),
        };

        let mut entities: Vec<Entity> = file
            .entities
            .iter()
            .map(|s| Entity {
                code: s.code,
                org_id: s.org_id.clone(),
                api_base: s.api_base.clone(),
                currency: s.currency.clone().unwrap_or_else(|| s.code.default_currency()),
            })
            .collect();

        for code in EntityCode::ALL {
            let org_var = format!("ORG_ID_{}", code.as_str());
            let base_var = format!("ZOHO_BOOKS_API_{}", code.as_str());

            let index = match entities.iter().position(|e| e.code == code) {
                Some(i) => i,
                None => {
                    if env(&org_var).is_none() {
                        continue;
                    }
                    let mut entity = Entity::new(code, "");
                    if code == EntityCode::Kk {
                        entity.api_base = Some(JAPAN_API_BASE.to_string());
                    }
                    entities.push(entity);
                    entities.len() - 1
                }
            };

            if let Some(org_id) = env(&org_var) {
                entities[index].org_id = org_id;
            }
            if let Some(base) = env(&base_var) {
                entities[index].api_base = Some(base);
            }
        }

        Ok(Self {
            client_id: pick("ZB_CLIENT_ID", file.zoho.client_id),
            client_secret: pick("ZB_CLIENT_SECRET", file.zoho.client_secret),
            refresh_token: pick("ZB_REFRESH_TOKEN", file.zoho.refresh_token),
            api_base: env("ZOHO_BOOKS_API")
                .or(file.zoho.api_base)
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            accounts_url: env("ZOHO_ACCOUNTS_URL")
                .or(file.zoho.accounts_url)
                .unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string()),
            entities,
            cash_source,
            token_skew: Duration::from_secs(
                parse_secs("CFOBOT_TOKEN_SKEW_SECS", file.token_skew_secs)?
                    .unwrap_or(DEFAULT_TOKEN_SKEW_SECS),
            ),
            request_timeout: Duration::from_secs(
                parse_secs("CFOBOT_REQUEST_TIMEOUT_SECS", file.request_timeout_secs)?
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            refresh_interval: parse_secs("CFOBOT_REFRESH_INTERVAL_SECS", file.refresh_interval_secs)?
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        })
    }

    /// Check that everything needed to talk to the ledger is present
    pub fn validate(&self) -> std::result::Result<(), Error> {
        let required = [
            ("ZB_CLIENT_ID", &self.client_id),
            ("ZB_CLIENT_SECRET", &self.client_secret),
            ("ZB_REFRESH_TOKEN", &self.refresh_token),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::config(format!("{} is not set", name)));
            }
        }

        for code in EntityCode::ALL {
            let count = self.entities.iter().filter(|e| e.code == code).count();
            match count {
                0 => return Err(Error::config(format!("ORG_ID_{} is not set", code.as_str()))),
                1 => {}
                _ => return Err(Error::config(format!("entity {} configured twice", code))),
            }
        }

        if let Some(entity) = self.entities.iter().find(|e| e.org_id.trim().is_empty()) {
            return Err(Error::config(format!("ORG_ID_{} is empty", entity.code.as_str())));
        }

        Ok(())
    }
}
