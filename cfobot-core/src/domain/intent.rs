//! Query intents
//!
//! Free text is matched against the intent patterns exactly once, at the
//! boundary. Everything downstream works with the typed [`Query`].

use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::dates::parse_reference_date;
use super::entity::{EntityCode, EntityScope};

/// What the user is asking about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CashBalance,
    Invoices,
    OverdueInvoices,
    ProfitAndLoss,
}

impl Intent {
    /// Human name used in replies ("Unable to fetch cash balance right now")
    pub fn subject(&self) -> &'static str {
        match self {
            Intent::CashBalance => "cash balance",
            Intent::Invoices => "invoices",
            Intent::OverdueInvoices => "overdue invoices",
            Intent::ProfitAndLoss => "P&L",
        }
    }

    /// Detect the intent of a message; earlier patterns win
    pub fn detect(text: &str) -> Option<Intent> {
        intent_patterns()
            .iter()
            .find(|(_, re)| re.is_match(text))
            .map(|(intent, _)| *intent)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subject())
    }
}

fn intent_patterns() -> &'static [(Intent, Regex)] {
    static PATTERNS: OnceLock<Vec<(Intent, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (
                Intent::OverdueInvoices,
                r"(?i)\b(overdue|past[\s-]due|due\s+(soon|today)|aging|ageing)\b",
            ),
            (Intent::Invoices, r"(?i)\b(invoices?|receivables?|ar)\b"),
            (
                Intent::ProfitAndLoss,
                r"(?i)(\bp\s*&\s*l\b|\bpnl\b|\bprofit\b|\bloss\b|\bincome\s+statement\b)",
            ),
            (Intent::CashBalance, r"(?i)\b(cash|balance|bank)\b"),
        ]
        .into_iter()
        .map(|(intent, pattern)| (intent, Regex::new(pattern).expect("valid regex")))
        .collect()
    })
}

fn entity_patterns() -> &'static [(EntityCode, Regex)] {
    static PATTERNS: OnceLock<Vec<(EntityCode, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        EntityCode::ALL
            .iter()
            .map(|code| {
                let pattern = format!(r"(?i)\b{}\b", code.as_str());
                (*code, Regex::new(&pattern).expect("valid regex"))
            })
            .collect()
    })
}

/// A routed query: intent, entity scope and optional reference date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub intent: Intent,
    pub scope: EntityScope,
    /// Date parsed from the message; `None` means "today"
    pub reference_date: Option<NaiveDate>,
}

impl Query {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent,
            scope: EntityScope::All,
            reference_date: None,
        }
    }

    pub fn with_scope(mut self, scope: EntityScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_reference_date(mut self, date: Option<NaiveDate>) -> Self {
        self.reference_date = date;
        self
    }

    /// Route a chat message; `None` when the message is not a finance question
    pub fn parse(text: &str, today: NaiveDate) -> Option<Self> {
        let intent = Intent::detect(text)?;

        let mentioned: Vec<EntityCode> = entity_patterns()
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(code, _)| *code)
            .collect();

        // Naming both entities is the same as naming neither
        let scope = match mentioned.as_slice() {
            [only] => EntityScope::Only(*only),
            _ => EntityScope::All,
        };

        Some(Self {
            intent,
            scope,
            reference_date: parse_reference_date(text, today),
        })
    }

    /// Reference date, defaulting to `today`
    pub fn reference_date_or(&self, today: NaiveDate) -> NaiveDate {
        self.reference_date.unwrap_or(today)
    }
}
