//! Query command - read-only SQL against the ledger database

use std::path::Path;

use anyhow::{anyhow, Result};

use super::{get_context, get_logger, log_event};
use crate::output;
use coffer_core::services::Event;

pub fn run(sql: Option<&str>, file: Option<&Path>, json: bool) -> Result<()> {
    let sql = match (sql, file) {
        (Some(s), None) => s.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (Some(_), Some(_)) => return Err(anyhow!("Provide SQL inline or via --file, not both")),
        (None, None) => return Err(anyhow!("No SQL provided; pass a query or --file")),
    };

    let logger = get_logger();
    let ctx = get_context(logger.clone())?;

    let result = match ctx.query_service.execute(&sql) {
        Ok(result) => result,
        Err(e) => {
            log_event(
                &logger,
                Event::new("query_failed")
                    .with_command("query")
                    .with_error_kind(e.kind())
                    .with_error(e.to_string()),
            );
            return Err(e.into());
        }
    };

    log_event(&logger, Event::new("query_executed").with_command("query"));

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "columns": result.columns,
                "rows": result.rows,
                "row_count": result.row_count,
            }))?
        );
        return Ok(());
    }

    if result.rows.is_empty() {
        output::info("No rows returned");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(result.columns.clone());
    for row in &result.rows {
        table.add_row(row.iter().map(render_value));
    }
    println!("{table}");
    println!("{} row(s)", result.row_count);
    Ok(())
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
