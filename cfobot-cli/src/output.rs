//! Output formatting utilities

use colored::Colorize;
use serde::Serialize;

use cfobot_core::services::NOT_AVAILABLE;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Print a chat reply, highlighting entities that could not be fetched
pub fn reply(text: &str) {
    for line in text.lines() {
        if line.starts_with("⚠️") {
            error(line);
        } else if line.ends_with(NOT_AVAILABLE) {
            warning(line);
        } else if !line.starts_with(' ') && !line.contains(':') {
            println!("{}", line.bold());
        } else {
            println!("{}", line);
        }
    }
}

/// Print any serializable value as pretty JSON
pub fn json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
