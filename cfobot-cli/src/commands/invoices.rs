//! Invoice commands - outstanding invoices and aging

use anyhow::Result;
use cfobot_core::services::aggregate::{render_aging, render_invoices};
use cfobot_core::{EntityCode, EntityScope};

use super::{get_context, parse_date_arg, today};
use crate::output;

pub async fn run(entity: Option<EntityCode>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let results = ctx
        .finance
        .outstanding_invoices(EntityScope::from(entity))
        .await;

    if json {
        return output::json(&results);
    }

    output::reply(&render_invoices(&results));
    Ok(())
}

pub async fn run_overdue(entity: Option<EntityCode>, date: Option<&str>, json: bool) -> Result<()> {
    let reference_date = parse_date_arg("date", date)?.unwrap_or_else(today);
    let ctx = get_context()?;
    let results = ctx
        .finance
        .invoice_aging(EntityScope::from(entity), reference_date)
        .await;

    if json {
        return output::json(&results);
    }

    output::reply(&render_aging(reference_date, &results));
    Ok(())
}
