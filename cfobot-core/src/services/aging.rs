//! Invoice aging - partition outstanding invoices by due-date proximity

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{sum_amounts, AgingBucket, LineItem};

/// Days ahead of the reference date that still count as "due soon"
pub const DUE_SOON_DAYS: i64 = 7;

/// Totals per aging bucket for one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgingReport {
    pub reference_date: NaiveDate,
    pub invoice_count: usize,
    /// Sum over all outstanding invoices, whatever their bucket
    pub outstanding_total: Decimal,
    pub due_today_total: Decimal,
    pub due_within_7_total: Decimal,
    pub overdue_total: Decimal,
    pub other_total: Decimal,
    /// Overdue invoices, oldest due date first
    pub overdue_detail: Vec<LineItem>,
}

/// Bucket of a single due date, at calendar-day granularity
pub fn bucket_for(due_date: Option<NaiveDate>, reference_date: NaiveDate) -> AgingBucket {
    let Some(due) = due_date else {
        return AgingBucket::OtherOutstanding;
    };

    if due == reference_date {
        AgingBucket::DueToday
    } else if due < reference_date {
        AgingBucket::Overdue
    } else if due <= reference_date + Duration::days(DUE_SOON_DAYS) {
        AgingBucket::DueWithin7Days
    } else {
        AgingBucket::OtherOutstanding
    }
}

/// Classify outstanding invoices against `reference_date`
///
/// Buckets are mutually exclusive, so
/// `outstanding_total == due_today + due_within_7 + overdue + other`.
/// A total that leaves the decimal range is reported as zero.
pub fn classify(invoices: &[LineItem], reference_date: NaiveDate) -> AgingReport {
    let mut due_today = Vec::new();
    let mut due_within_7 = Vec::new();
    let mut overdue = Vec::new();
    let mut other = Vec::new();
    let mut overdue_detail = Vec::new();

    for invoice in invoices {
        let amount = invoice.outstanding;
        match bucket_for(invoice.due_date, reference_date) {
            AgingBucket::DueToday => due_today.push(amount),
            AgingBucket::DueWithin7Days => due_within_7.push(amount),
            AgingBucket::Overdue => {
                overdue.push(amount);
                overdue_detail.push(invoice.clone());
            }
            AgingBucket::OtherOutstanding => other.push(amount),
        }
    }

    overdue_detail.sort_by_key(|inv| inv.due_date);
    AgingReport {
        reference_date,
        invoice_count: invoices.len(),
        outstanding_total: sum_amounts(invoices.iter().map(|inv| inv.outstanding)),
        due_today_total: sum_amounts(due_today),
        due_within_7_total: sum_amounts(due_within_7),
        overdue_total: sum_amounts(overdue),
        other_total: sum_amounts(other),
        overdue_detail,
    }
}
