//! Token command - force a Zoho access token refresh

use anyhow::{Context, Result};
use serde_json::json;
use tokio::time::Instant;

use super::get_context;
use crate::output;

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let credential = ctx
        .credentials
        .refresh_now()
        .await
        .context("Token refresh failed")?;
    let remaining = credential.remaining(Instant::now());

    if json {
        return output::json(&json!({
            "refreshed": true,
            "expiresInSecs": remaining.as_secs(),
            "accountsUrl": ctx.config.accounts_url,
        }));
    }

    output::success("Access token refreshed");
    println!("  Valid for: {}s", remaining.as_secs());
    println!("  Issuer:    {}", ctx.config.accounts_url);
    Ok(())
}
