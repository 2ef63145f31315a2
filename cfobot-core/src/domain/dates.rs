//! Reference dates from free-text queries
//!
//! Recognises the handful of date expressions people actually type into a
//! finance chat ("as of 2024-01-31", "end of last month", "3 days ago",
//! "10 Jan"). Anything unrecognised yields `None`, and callers fall back to
//! today's date.

use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;

const MONTHS: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const MONTH_PATTERN: &str =
    r"(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)(?:uary|ruary|ch|il|e|y|ust|t|tember|ober|ember)?\.?";

struct Patterns {
    iso: Regex,
    dmy: Regex,
    day_month: Regex,
    month_day: Regex,
    days_ago: Regex,
    in_days: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        iso: Regex::new(r"\b(\d{4})[-/](\d{1,2})[-/](\d{1,2})\b").expect("valid regex"),
        dmy: Regex::new(r"\b(\d{1,2})[/.](\d{1,2})[/.](\d{4})\b").expect("valid regex"),
        day_month: Regex::new(&format!(
            r"\b(\d{{1,2}})(?:st|nd|rd|th)?\s+{}(?:,?\s+(\d{{4}}))?\b",
            MONTH_PATTERN
        ))
        .expect("valid regex"),
        month_day: Regex::new(&format!(
            r"\b{}\s+(\d{{1,2}})(?:st|nd|rd|th)?(?:,?\s+(\d{{4}}))?\b",
            MONTH_PATTERN
        ))
        .expect("valid regex"),
        days_ago: Regex::new(r"\b(\d{1,3})\s+days?\s+ago\b").expect("valid regex"),
        in_days: Regex::new(r"\bin\s+(\d{1,3})\s+days?\b").expect("valid regex"),
    })
}

/// Parse a reference date out of free text, relative to `today`
pub fn parse_reference_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = text.to_lowercase();
    parse_absolute(&text, today).or_else(|| parse_relative(&text, today))
}

fn parse_absolute(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let p = patterns();

    if let Some(c) = p.iso.captures(text) {
        return ymd(&c[1], &c[2], &c[3]);
    }

    if let Some(c) = p.dmy.captures(text) {
        return ymd(&c[3], &c[2], &c[1]);
    }

    if let Some(c) = p.day_month.captures(text) {
        let day: u32 = c[1].parse().ok()?;
        let month = month_index(&c[2])?;
        let year = c.get(3).and_then(|y| y.as_str().parse().ok()).unwrap_or(today.year());
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(c) = p.month_day.captures(text) {
        let month = month_index(&c[1])?;
        let day: u32 = c[2].parse().ok()?;
        let year = c.get(3).and_then(|y| y.as_str().parse().ok()).unwrap_or(today.year());
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}

fn parse_relative(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let p = patterns();

    if let Some(c) = p.days_ago.captures(text) {
        let days: i64 = c[1].parse().ok()?;
        return today.checked_sub_signed(Duration::days(days));
    }

    if let Some(c) = p.in_days.captures(text) {
        let days: i64 = c[1].parse().ok()?;
        return today.checked_add_signed(Duration::days(days));
    }

    if text.contains("yesterday") {
        return today.pred_opt();
    }
    if text.contains("tomorrow") {
        return today.succ_opt();
    }
    if text.contains("last week") {
        return today.checked_sub_signed(Duration::days(7));
    }
    if text.contains("next week") {
        return today.checked_add_signed(Duration::days(7));
    }
    if text.contains("last month") {
        // Last day of the previous month
        return first_of_month(today).pred_opt();
    }
    if text.contains("end of this month") || text.contains("end of month") || text.contains("month end") {
        return last_of_month(today);
    }
    if text.contains("today") {
        return Some(today);
    }

    None
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn month_index(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?;
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .map(|i| i as u32 + 1)
}

/// First day of the month containing `date`
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of the month containing `date`
pub fn last_of_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}
