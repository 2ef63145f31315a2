//! P&L command - net profit or loss per entity

use anyhow::{bail, Result};
use cfobot_core::domain::dates::first_of_month;
use cfobot_core::services::aggregate::render_totals;
use cfobot_core::{EntityCode, EntityScope};

use super::{get_context, parse_date_arg, today};
use crate::output;

pub async fn run(
    entity: Option<EntityCode>,
    from: Option<&str>,
    to: Option<&str>,
    json: bool,
) -> Result<()> {
    let to = parse_date_arg("to", to)?.unwrap_or_else(today);
    let from = parse_date_arg("from", from)?.unwrap_or_else(|| first_of_month(to));
    if from > to {
        bail!("--from {} is after --to {}", from, to);
    }

    let ctx = get_context()?;
    let results = ctx
        .finance
        .profit_and_loss(EntityScope::from(entity), from, to)
        .await;

    if json {
        return output::json(&results);
    }

    output::reply(&render_totals("📊", &format!("P&L {} to {}", from, to), &results));
    Ok(())
}
