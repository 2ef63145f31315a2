//! Monetary totals and per-entity currency formatting

use log::warn;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::entity::EntityCode;

/// How an entity's amounts are presented in chat replies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyFormat {
    /// Currency code (ISO 4217)
    pub code: String,
    /// Prefix written before the number, e.g. "¥" or "Rp "
    pub symbol: String,
    pub decimal_places: u32,
    pub group_separator: String,
    pub decimal_separator: String,
}

impl CurrencyFormat {
    /// Japanese yen: no minor units, comma grouping
    pub fn jpy() -> Self {
        Self {
            code: "JPY".to_string(),
            symbol: "¥".to_string(),
            decimal_places: 0,
            group_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
        }
    }

    /// Indonesian rupiah, id-ID convention (dot grouping, comma decimals)
    pub fn idr() -> Self {
        Self {
            code: "IDR".to_string(),
            symbol: "Rp ".to_string(),
            decimal_places: 0,
            group_separator: ".".to_string(),
            decimal_separator: ",".to_string(),
        }
    }

    /// Format an amount with symbol and thousands grouping
    ///
    /// Rounds half away from zero to `decimal_places`; negatives are written
    /// as `-¥1,000`.
    pub fn format(&self, amount: Decimal) -> String {
        let rounded = amount
            .round_dp_with_strategy(self.decimal_places, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let digits = rounded.abs().to_string();

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i.to_string(), f.to_string()),
            None => (digits, String::new()),
        };

        let mut out = String::new();
        if negative {
            out.push('-');
        }
        out.push_str(&self.symbol);
        out.push_str(&group_digits(&int_part, &self.group_separator));

        if self.decimal_places > 0 {
            let mut frac = frac_part;
            while frac.len() < self.decimal_places as usize {
                frac.push('0');
            }
            out.push_str(&self.decimal_separator);
            out.push_str(&frac);
        }
        out
    }
}

fn group_digits(digits: &str, separator: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3 * separator.len());
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

/// A reduced amount for one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonetaryTotal {
    pub entity: EntityCode,
    pub amount: Decimal,
    /// Currency code of the amount
    pub currency: String,
}

impl MonetaryTotal {
    pub fn new(entity: EntityCode, amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            entity,
            amount,
            currency: currency.into(),
        }
    }
}

/// Sum of `amounts`, or zero when the sum leaves the decimal range
pub fn sum_amounts<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .unwrap_or_else(|| {
            warn!("Amounts overflow the decimal range, reporting zero");
            Decimal::ZERO
        })
}
