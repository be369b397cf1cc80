//! Audit command - run ledger consistency checks

use anyhow::Result;
use colored::Colorize;

use super::{get_context, get_logger, log_event};
use crate::output;
use coffer_core::services::{CheckStatus, Event};

pub fn run(json: bool) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context(logger.clone())?;

    let report = ctx.audit_service.run_checks()?;

    log_event(
        &logger,
        Event::new(if report.is_clean() {
            "audit_clean"
        } else {
            "audit_findings"
        })
        .with_command("audit"),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", "Ledger Audit".bold());
        println!();
        for check in &report.checks {
            let marker = match check.status {
                CheckStatus::Pass => "PASS".green(),
                CheckStatus::Warning => "WARN".yellow(),
                CheckStatus::Error => "FAIL".red(),
            };
            println!("[{marker}] {}: {}", check.name, check.detail);
            for offender in &check.offenders {
                println!("       {offender}");
            }
        }
    }

    if report.has_errors() {
        // Non-zero exit for scripting
        anyhow::bail!("audit found ledger inconsistencies");
    }
    if !report.is_clean() && !json {
        output::warning("Audit completed with warnings");
    }
    Ok(())
}
