//! Aggregation layer - multi-entity chat replies
//!
//! Every renderer enumerates all entities it is given, in the order given
//! (configuration order). An entity without a value renders as
//! "not available" instead of disappearing from the reply.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{sum_amounts, CurrencyFormat, Entity, LineItem, MonetaryTotal};
use crate::services::aging::AgingReport;

/// Marker for an entity whose data could not be fetched
pub const NOT_AVAILABLE: &str = "not available";

/// Line items listed per entity before the rest is summarised
pub const MAX_LISTED_ITEMS: usize = 50;

/// One entity's contribution to a reply; `None` when fetching it failed
#[derive(Debug, Clone, Serialize)]
pub struct EntityResult<T> {
    pub entity: Entity,
    pub value: Option<T>,
}

impl<T> EntityResult<T> {
    pub fn new(entity: Entity, value: Option<T>) -> Self {
        Self { entity, value }
    }

    pub fn is_available(&self) -> bool {
        self.value.is_some()
    }
}

/// One `icon CODE: amount` line per entity under `header`
pub fn render_totals(icon: &str, header: &str, results: &[EntityResult<MonetaryTotal>]) -> String {
    let mut lines = Vec::with_capacity(results.len() + 1);
    if !header.is_empty() {
        lines.push(header.to_string());
    }

    for result in results {
        let value = match &result.value {
            Some(total) => result.entity.currency.format(total.amount),
            None => NOT_AVAILABLE.to_string(),
        };
        lines.push(format!("{} {}: {}", icon, result.entity.code, value));
    }

    lines.join("\n")
}

/// Outstanding invoices per entity, one `counterparty | id | due | amount` line each
pub fn render_invoices(results: &[EntityResult<Vec<LineItem>>]) -> String {
    let mut lines = Vec::new();

    for result in results {
        let code = result.entity.code;
        let currency = &result.entity.currency;

        match &result.value {
            None => lines.push(format!("🧾 {}: {}", code, NOT_AVAILABLE)),
            Some(items) if items.is_empty() => {
                lines.push(format!("🧾 {}: no outstanding invoices", code))
            }
            Some(items) => {
                let total = sum_amounts(items.iter().map(|i| i.outstanding));
                lines.push(format!(
                    "🧾 {}: {} outstanding {}, {}",
                    code,
                    items.len(),
                    if items.len() == 1 { "invoice" } else { "invoices" },
                    currency.format(total)
                ));
                push_items(&mut lines, items, currency);
            }
        }
    }

    lines.join("\n")
}

/// Aging totals per entity followed by the overdue invoices
pub fn render_aging(reference_date: NaiveDate, results: &[EntityResult<AgingReport>]) -> String {
    let mut lines = vec![format!("⏰ Invoice aging as of {}", reference_date)];

    for result in results {
        let code = result.entity.code;
        let currency = &result.entity.currency;

        let Some(report) = &result.value else {
            lines.push(format!("{}: {}", code, NOT_AVAILABLE));
            continue;
        };

        lines.push(format!(
            "{}: outstanding {} | due today {} | due within 7 days {} | overdue {}",
            code,
            currency.format(report.outstanding_total),
            currency.format(report.due_today_total),
            currency.format(report.due_within_7_total),
            currency.format(report.overdue_total),
        ));
        push_items(&mut lines, &report.overdue_detail, currency);
    }

    lines.join("\n")
}

/// `counterparty | identifier | due-date | amount`
pub fn format_line_item(item: &LineItem, currency: &CurrencyFormat) -> String {
    let due = item
        .due_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());
    let counterparty = if item.counterparty.is_empty() {
        "(unknown)"
    } else {
        &item.counterparty
    };
    format!(
        "{} | {} | {} | {}",
        counterparty,
        item.identifier(),
        due,
        currency.format(item.outstanding)
    )
}

fn push_items(lines: &mut Vec<String>, items: &[LineItem], currency: &CurrencyFormat) {
    for item in items.iter().take(MAX_LISTED_ITEMS) {
        lines.push(format!("  {}", format_line_item(item, currency)));
    }
    if items.len() > MAX_LISTED_ITEMS {
        lines.push(format!("  … and {} more", items.len() - MAX_LISTED_ITEMS));
    }
}
