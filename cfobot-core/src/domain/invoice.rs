//! Invoice line items and aging buckets

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Invoice status as reported by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Sent,
    PartiallyPaid,
    Overdue,
    /// Any status this engine does not treat as outstanding (draft, paid, void...)
    Other(String),
}

impl InvoiceStatus {
    pub fn parse(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            "sent" => InvoiceStatus::Sent,
            "partially_paid" => InvoiceStatus::PartiallyPaid,
            "overdue" => InvoiceStatus::Overdue,
            other => InvoiceStatus::Other(other.to_string()),
        }
    }

    /// Sent, partially paid and overdue invoices still have money owed on them
    ///
    /// Zoho moves past-due `sent` invoices to `overdue`, which are still owed.
    pub fn is_outstanding(&self) -> bool {
        !matches!(self, InvoiceStatus::Other(_))
    }
}

/// An outstanding invoice, snapshotted for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub number: String,
    pub counterparty: String,
    pub due_date: Option<NaiveDate>,
    pub outstanding: Decimal,
    pub status: InvoiceStatus,
}

impl LineItem {
    /// Number if the ledger gave one, otherwise the internal id
    pub fn identifier(&self) -> &str {
        if self.number.is_empty() {
            &self.id
        } else {
            &self.number
        }
    }
}

/// Due-date proximity of an outstanding invoice relative to a reference date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingBucket {
    DueToday,
    DueWithin7Days,
    Overdue,
    OtherOutstanding,
}
