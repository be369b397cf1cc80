//! Init command - create the coffer directory and provision the ledger

use anyhow::Result;

use super::{get_coffer_dir, get_context, get_logger, log_event};
use crate::output;
use coffer_core::services::Event;

pub fn run(currency: Option<String>) -> Result<()> {
    let logger = get_logger();
    let coffer_dir = get_coffer_dir();
    let ctx = get_context(logger.clone())?;

    let currency = currency.unwrap_or_else(|| ctx.config.default_currency.clone());
    let system = ctx.account_service.ensure_system_account(&currency)?;

    log_event(&logger, Event::new("command_executed").with_command("init"));

    output::success(&format!("Initialized coffer in {}", coffer_dir.display()));
    println!("Ledger database: {}", ctx.repository.db_path().display());
    println!("System account:  {} ({})", system.id, system.currency);
    Ok(())
}
