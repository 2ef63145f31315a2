//! Report extractors
//!
//! Pure functions that reduce a raw ledger JSON tree to domain values. Every
//! extractor is total: a missing node, a wrong type or an unparseable number
//! contributes zero (or nothing) instead of failing, so one entity's odd
//! payload cannot abort another entity's answer.
//!
//! Field names drift between API versions, so each balance is read through an
//! ordered candidate list below rather than hard-coded accessors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

use crate::domain::{sum_amounts, InvoiceStatus, LineItem};
use crate::ports::endpoints;

// =============================================================================
// Field tables
// =============================================================================

/// Chart of accounts balance fields, oldest API first
pub const ACCOUNT_BALANCE_FIELDS: &[&str] =
    &["balance", "bcy_balance", "current_balance", "account_balance"];

/// Bank account balance fields; base-currency balance preferred
pub const BANK_BALANCE_FIELDS: &[&str] = &["bcy_balance", "balance", "current_balance"];

/// Balance sheet account amount fields
pub const BALANCE_SHEET_AMOUNT_FIELDS: &[&str] = &["bcy_amount", "amount", "balance", "total"];

/// Footer fields holding the closing cash of a cash-flow statement
pub const CASH_FLOW_CLOSING_FIELDS: &[&str] =
    &["closing_balance", "ending_balance", "cash_at_end_of_period"];

/// Section names holding the closing cash of a cash-flow statement
pub const CASH_FLOW_CLOSING_SECTIONS: &[&str] = &[
    "ending cash balance",
    "closing cash balance",
    "cash at end of period",
    "cash at the end of the period",
];

/// Arrays that hold the sections of a cash-flow statement
const CASH_FLOW_SECTION_KEYS: &[&str] = &["cash_flow", "cashflow", "sections"];

/// Section names holding net profit of a profit and loss report
pub const NET_PROFIT_SECTIONS: &[&str] =
    &["net profit/loss", "net profit/(loss)", "net profit", "net income"];

/// Amount fields of a report section
pub const SECTION_TOTAL_FIELDS: &[&str] = &["total", "amount", "bcy_amount"];

/// Outstanding amount of an invoice
pub const INVOICE_OUTSTANDING_FIELDS: &[&str] = &["balance", "balance_due"];

/// Counterparty name of an invoice
pub const COUNTERPARTY_FIELDS: &[&str] = &["customer_name", "contact_name", "vendor_name"];

/// Account types that count as cash
const CASH_ACCOUNT_TYPES: &[&str] = &["cash", "bank"];

/// Deepest nesting the tree walker descends into, arrays and objects alike
///
/// Above serde_json's own recursion limit, so any parsed tree is walked whole.
const MAX_DEPTH: usize = 256;

// =============================================================================
// Field helpers
// =============================================================================

/// Convert a JSON number or numeric string to a decimal
pub fn to_decimal(value: &JsonValue) -> Option<Decimal> {
    match value {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                n.to_string()
                    .parse::<Decimal>()
                    .ok()
                    .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok()))
            }
        }
        JsonValue::String(s) => s.trim().replace(',', "").parse::<Decimal>().ok(),
        _ => None,
    }
}

/// Amount of the first candidate field present on `obj`
///
/// Only the first present (non-null) candidate is consulted; when it is not
/// numeric the result is zero.
pub fn first_amount(obj: &JsonValue, candidates: &[&str]) -> Decimal {
    candidates
        .iter()
        .find_map(|field| obj.get(*field).filter(|v| !v.is_null()))
        .and_then(to_decimal)
        .unwrap_or(Decimal::ZERO)
}

/// String form of the first candidate field present on `obj` (numbers included)
fn first_string(obj: &JsonValue, candidates: &[&str]) -> String {
    candidates
        .iter()
        .find_map(|field| match obj.get(*field) {
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(JsonValue::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Records of a list response: `tree[key]`, or the tree itself if it is an array
fn records<'a>(tree: &'a JsonValue, key: &str) -> &'a [JsonValue] {
    tree.as_array()
        .or_else(|| tree.get(key).and_then(|v| v.as_array()))
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

fn is_cash_account(obj: &JsonValue) -> bool {
    obj.get("account_type")
        .and_then(|v| v.as_str())
        .map(|t| CASH_ACCOUNT_TYPES.contains(&t.trim().to_lowercase().as_str()))
        .unwrap_or(false)
}

fn name_matches(obj: &JsonValue, names: &[&str]) -> bool {
    obj.get("name")
        .and_then(|v| v.as_str())
        .map(|n| names.contains(&n.trim().to_lowercase().as_str()))
        .unwrap_or(false)
}

// =============================================================================
// Tree walking
// =============================================================================

/// What the walker does after visiting an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Visit the object's children too
    Descend,
    /// Do not look inside this object
    Skip,
    /// Abort the whole walk
    Stop,
}

/// Depth-first, pre-order walk over every object in `tree`
///
/// Arrays are transparent; every object is handed to `visit`, which decides
/// whether to go deeper. Nesting depth is not assumed anywhere.
pub fn walk<F>(tree: &JsonValue, visit: &mut F)
where
    F: FnMut(&JsonValue) -> Visit,
{
    walk_inner(tree, visit, 0);
}

fn walk_inner<F>(value: &JsonValue, visit: &mut F, depth: usize) -> bool
where
    F: FnMut(&JsonValue) -> Visit,
{
    if depth > MAX_DEPTH {
        return true;
    }
    match value {
        JsonValue::Object(map) => match visit(value) {
            Visit::Stop => false,
            Visit::Skip => true,
            Visit::Descend => map.values().all(|child| walk_inner(child, visit, depth + 1)),
        },
        JsonValue::Array(items) => items.iter().all(|item| walk_inner(item, visit, depth + 1)),
        _ => true,
    }
}

// =============================================================================
// Extractors
// =============================================================================

/// Reports that reduce to a single total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalReport {
    /// Chart of accounts filtered to cash/bank accounts
    AccountList,
    /// Active bank and cash accounts
    BankAccounts,
    /// Cash/bank accounts anywhere in a balance sheet
    BalanceSheet,
    /// Closing cash of a cash-flow statement
    CashFlow,
    /// Net profit of a profit and loss report
    ProfitAndLoss,
}

impl TotalReport {
    pub fn endpoint(&self) -> &'static str {
        match self {
            TotalReport::AccountList => endpoints::CHART_OF_ACCOUNTS,
            TotalReport::BankAccounts => endpoints::BANK_ACCOUNTS,
            TotalReport::BalanceSheet => endpoints::BALANCE_SHEET,
            TotalReport::CashFlow => endpoints::CASH_FLOW,
            TotalReport::ProfitAndLoss => endpoints::PROFIT_AND_LOSS,
        }
    }

    /// Reduce `tree` to this report's total
    pub fn extract(&self, tree: &JsonValue) -> Decimal {
        match self {
            TotalReport::AccountList => account_list_total(tree),
            TotalReport::BankAccounts => bank_account_total(tree),
            TotalReport::BalanceSheet => balance_sheet_cash_total(tree),
            TotalReport::CashFlow => cash_flow_closing_total(tree),
            TotalReport::ProfitAndLoss => net_profit_total(tree),
        }
    }
}

/// Sum of cash and bank balances in a chart of accounts
pub fn account_list_total(tree: &JsonValue) -> Decimal {
    sum_amounts(
        records(tree, "chartofaccounts")
            .iter()
            .filter(|acc| is_cash_account(acc))
            .map(|acc| first_amount(acc, ACCOUNT_BALANCE_FIELDS)),
    )
}

/// Sum of balances of active bank and cash accounts
pub fn bank_account_total(tree: &JsonValue) -> Decimal {
    sum_amounts(
        records(tree, "bankaccounts")
            .iter()
            .filter(|acc| acc.get("is_active").and_then(|v| v.as_bool()) != Some(false))
            .filter(|acc| is_cash_account(acc))
            .map(|acc| first_amount(acc, BANK_BALANCE_FIELDS)),
    )
}

/// Sum of every cash/bank account in a balance sheet, at any depth
pub fn balance_sheet_cash_total(tree: &JsonValue) -> Decimal {
    let mut amounts = Vec::new();
    walk(tree, &mut |node| {
        if is_cash_account(node) {
            amounts.push(first_amount(node, BALANCE_SHEET_AMOUNT_FIELDS));
            // Sub-accounts are already rolled into the parent amount
            Visit::Skip
        } else {
            Visit::Descend
        }
    });
    sum_amounts(amounts)
}

/// Closing cash reported by a cash-flow statement
///
/// Read from the footer fields first, then from the last closing section.
/// This is the designated total, never a sum over sections.
pub fn cash_flow_closing_total(tree: &JsonValue) -> Decimal {
    for holder in [Some(tree), tree.get("footer"), tree.get("summary")]
        .into_iter()
        .flatten()
    {
        if CASH_FLOW_CLOSING_FIELDS
            .iter()
            .any(|f| holder.get(*f).is_some_and(|v| !v.is_null()))
        {
            return first_amount(holder, CASH_FLOW_CLOSING_FIELDS);
        }
    }

    CASH_FLOW_SECTION_KEYS
        .iter()
        .find_map(|key| tree.get(*key).and_then(|v| v.as_array()))
        .and_then(|sections| {
            sections
                .iter()
                .rev()
                .find(|s| name_matches(s, CASH_FLOW_CLOSING_SECTIONS))
        })
        .map(|section| first_amount(section, SECTION_TOTAL_FIELDS))
        .unwrap_or(Decimal::ZERO)
}

/// Net profit (negative for a loss) of a profit and loss report
pub fn net_profit_total(tree: &JsonValue) -> Decimal {
    let mut found = None;
    walk(tree, &mut |node| {
        if name_matches(node, NET_PROFIT_SECTIONS) {
            found = Some(first_amount(node, SECTION_TOTAL_FIELDS));
            Visit::Stop
        } else {
            Visit::Descend
        }
    });
    found.unwrap_or(Decimal::ZERO)
}

/// Outstanding invoices of an invoice list
pub fn outstanding_invoices(tree: &JsonValue) -> Vec<LineItem> {
    records(tree, "invoices")
        .iter()
        .filter(|inv| inv.is_object())
        .filter_map(|inv| {
            let status = InvoiceStatus::parse(inv.get("status").and_then(|v| v.as_str())?);
            if !status.is_outstanding() {
                return None;
            }

            let due_date = inv
                .get("due_date")
                .and_then(|v| v.as_str())
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());

            Some(LineItem {
                id: first_string(inv, &["invoice_id"]),
                number: first_string(inv, &["invoice_number"]),
                counterparty: first_string(inv, COUNTERPARTY_FIELDS),
                due_date,
                outstanding: first_amount(inv, INVOICE_OUTSTANDING_FIELDS),
                status,
            })
        })
        .collect()
}

/// Whether a list response says another page follows
pub fn has_more_pages(tree: &JsonValue) -> bool {
    tree.get("page_context")
        .and_then(|p| p.get("has_more_page"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}
