//! CFO bot CLI - finance answers for KK and PT in your terminal

use std::process::ExitCode;

use anyhow::{Context, Result};
use cfobot_core::{CashSource, EntityCode};
use clap::{Parser, Subcommand};
use tokio::runtime::Runtime;

mod commands;
mod output;

use commands::{ask, cash, invoices, pnl, token};

/// CFO bot - cash, invoices and P&L across KK and PT
#[derive(Parser)]
#[command(name = "cfobot", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one chat message, e.g. "cash balance PT"
    Ask {
        /// The message
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Answer messages from stdin, one reply per line
    Chat,

    /// Show cash balances
    Cash {
        /// Only this entity (KK or PT)
        #[arg(long, short)]
        entity: Option<EntityCode>,
        /// Balance as of a date ("2024-01-31", "end of last month", ...)
        #[arg(long)]
        as_of: Option<String>,
        /// Report to read cash from (bank_accounts, chart_of_accounts, balance_sheet, cash_flow)
        #[arg(long)]
        source: Option<CashSource>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List outstanding invoices
    Invoices {
        /// Only this entity (KK or PT)
        #[arg(long, short)]
        entity: Option<EntityCode>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show invoice aging and overdue invoices
    Overdue {
        /// Only this entity (KK or PT)
        #[arg(long, short)]
        entity: Option<EntityCode>,
        /// Reference date (defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show net profit or loss for a period
    Pnl {
        /// Only this entity (KK or PT)
        #[arg(long, short)]
        entity: Option<EntityCode>,
        /// Period start (defaults to the first of the end date's month)
        #[arg(long)]
        from: Option<String>,
        /// Period end (defaults to today)
        #[arg(long)]
        to: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Refresh the Zoho access token and show its lifetime
    Token {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let result = Runtime::new()
        .context("Failed to start async runtime")
        .and_then(|rt| rt.block_on(run(cli)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ask { text } => ask::run(&text.join(" ")).await,
        Commands::Chat => ask::run_chat().await,
        Commands::Cash { entity, as_of, source, json } => {
            cash::run(entity, as_of.as_deref(), source, json).await
        }
        Commands::Invoices { entity, json } => invoices::run(entity, json).await,
        Commands::Overdue { entity, date, json } => {
            invoices::run_overdue(entity, date.as_deref(), json).await
        }
        Commands::Pnl { entity, from, to, json } => {
            pnl::run(entity, from.as_deref(), to.as_deref(), json).await
        }
        Commands::Token { json } => token::run(json).await,
    }
}
