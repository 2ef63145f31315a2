//! CLI command implementations

pub mod ask;
pub mod cash;
pub mod invoices;
pub mod pnl;
pub mod token;

use std::path::PathBuf;

use anyhow::{Context, Result};
use cfobot_core::domain::dates::parse_reference_date;
use cfobot_core::CfoContext;
use chrono::{Local, NaiveDate};

/// Get the cfobot config directory from environment or default
///
/// `None` when neither is available; configuration then comes from the
/// environment alone.
pub fn get_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("CFOBOT_DIR") {
        Some(PathBuf::from(dir))
    } else {
        dirs::config_dir().map(|d| d.join("cfobot"))
    }
}

/// Load configuration and wire up the engine
pub fn get_context() -> Result<CfoContext> {
    let config_dir = get_config_dir();
    CfoContext::new(config_dir.as_deref()).context("Failed to initialize cfobot")
}

/// Today in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a date argument, accepting the same phrases as chat messages
pub fn parse_date_arg(name: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value {
        None => Ok(None),
        Some(text) => parse_reference_date(text, today())
            .map(Some)
            .with_context(|| format!("Could not understand --{} '{}'", name, text)),
    }
}
