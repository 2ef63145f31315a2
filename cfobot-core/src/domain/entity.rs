//! Legal entity domain model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::money::CurrencyFormat;

/// One of the two legal entities whose books are tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityCode {
    /// Japanese kabushiki kaisha, books kept in JPY
    Kk,
    /// Indonesian perseroan terbatas, books kept in IDR
    Pt,
}

impl EntityCode {
    pub const ALL: [EntityCode; 2] = [EntityCode::Kk, EntityCode::Pt];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCode::Kk => "KK",
            EntityCode::Pt => "PT",
        }
    }

    /// Default presentation currency for the entity
    pub fn default_currency(&self) -> CurrencyFormat {
        match self {
            EntityCode::Kk => CurrencyFormat::jpy(),
            EntityCode::Pt => CurrencyFormat::idr(),
        }
    }
}

impl fmt::Display for EntityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kk" => Ok(EntityCode::Kk),
            "pt" => Ok(EntityCode::Pt),
            other => Err(format!("unknown entity '{}' (expected KK or PT)", other)),
        }
    }
}

/// A configured entity: its ledger organization and how its money is shown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub code: EntityCode,
    /// Zoho Books organization id
    pub org_id: String,
    /// Per-entity API base (Zoho data centres differ by region)
    pub api_base: Option<String>,
    pub currency: CurrencyFormat,
}

impl Entity {
    pub fn new(code: EntityCode, org_id: impl Into<String>) -> Self {
        Self {
            code,
            org_id: org_id.into(),
            api_base: None,
            currency: code.default_currency(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// This entity's API base, or `default` when it has none of its own
    pub fn api_base_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.api_base
            .as_deref()
            .unwrap_or(default)
            .trim_end_matches('/')
    }
}

/// Which entities a query is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityScope {
    #[default]
    All,
    Only(EntityCode),
}

impl EntityScope {
    pub fn includes(&self, code: EntityCode) -> bool {
        match self {
            EntityScope::All => true,
            EntityScope::Only(only) => *only == code,
        }
    }

    /// Entities in scope, in configuration order
    pub fn select<'a>(&self, entities: &'a [Entity]) -> Vec<&'a Entity> {
        entities.iter().filter(|e| self.includes(e.code)).collect()
    }
}

impl From<Option<EntityCode>> for EntityScope {
    fn from(code: Option<EntityCode>) -> Self {
        code.map(EntityScope::Only).unwrap_or_default()
    }
}
