//! Ask and chat commands - answer free-text messages like the chat bot does

use anyhow::Result;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{get_context, today};
use crate::output;

const HELP: &str = "Try: \"cash balance\", \"invoices KK\", \"overdue as of 2024-01-10\", \"P&L PT last month\"";

pub async fn run(text: &str) -> Result<()> {
    let ctx = get_context()?;

    match ctx.finance.handle(text, today()).await {
        Some(reply) => output::reply(&reply),
        None => output::info(HELP),
    }
    Ok(())
}

pub async fn run_chat() -> Result<()> {
    let ctx = get_context()?;
    output::info("CFO bot ready. One question per line, Ctrl-D to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        match ctx.finance.handle(text, today()).await {
            Some(reply) => output::reply(&reply),
            None => println!("{}", HELP.dimmed()),
        }
        println!();
    }

    Ok(())
}
