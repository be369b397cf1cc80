//! Logs command - inspect the event log

use anyhow::{anyhow, Result};
use chrono::DateTime;

use super::get_logger;
use crate::output;

pub fn run(limit: usize, failures_only: bool, json: bool) -> Result<()> {
    let logger = get_logger().ok_or_else(|| anyhow!("Failed to open the event log"))?;

    let entries = if failures_only {
        logger.failures(limit)?
    } else {
        logger.recent(limit)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        output::info("No events recorded");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Event", "Command", "Error"]);
    for entry in &entries {
        let time = DateTime::from_timestamp_millis(entry.timestamp)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| entry.timestamp.to_string());
        let error = match (&entry.error_kind, &entry.error_message) {
            (Some(kind), Some(msg)) => format!("{kind}: {msg}"),
            (Some(kind), None) => kind.clone(),
            _ => String::new(),
        };
        table.add_row(vec![
            time,
            entry.event.clone(),
            entry.command.clone().unwrap_or_default(),
            error,
        ]);
    }
    println!("{table}");
    println!("{} of {} event(s)", entries.len(), logger.count()?);
    Ok(())
}
