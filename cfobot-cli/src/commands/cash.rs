//! Cash command - cash balances per entity

use anyhow::Result;
use cfobot_core::services::aggregate::render_totals;
use cfobot_core::{CashSource, EntityCode, EntityScope};

use super::{get_context, parse_date_arg};
use crate::output;

pub async fn run(
    entity: Option<EntityCode>,
    as_of: Option<&str>,
    source: Option<CashSource>,
    json: bool,
) -> Result<()> {
    let as_of = parse_date_arg("as-of", as_of)?;
    let ctx = get_context()?;

    let source = source.unwrap_or(ctx.finance.cash_source());
    let results = ctx
        .finance
        .cash_balances_from(EntityScope::from(entity), as_of, source)
        .await;

    if json {
        return output::json(&results);
    }

    let header = match as_of {
        Some(date) => format!("Cash balance as of {}", date),
        None => "Cash balance".to_string(),
    };
    output::reply(&render_totals("🏦", &header, &results));
    Ok(())
}
