//! Ledger commands - inspect and export an account's entry history

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Subcommand;
use uuid::Uuid;

use super::{get_context, get_logger};
use crate::output;
use coffer_core::domain::money::format_minor;
use coffer_core::ports::Repository;

#[derive(Subcommand)]
pub enum LedgerCommands {
    /// List ledger entries for an account
    List {
        /// Account id
        account: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export an account's ledger history to CSV
    Export {
        /// Account id
        account: String,
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },
}

pub fn run(command: LedgerCommands) -> Result<()> {
    match command {
        LedgerCommands::List { account, json } => list(&account, json),
        LedgerCommands::Export { account, output } => export(&account, output),
    }
}

fn parse_account_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| anyhow!("Invalid account id: {id}"))
}

fn list(account: &str, json: bool) -> Result<()> {
    let ctx = get_context(get_logger())?;
    let account_id = parse_account_id(account)?;

    let account = ctx.account_service.resolve(account_id)?;
    let entries = ctx.repository.entries_by_account(account_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        output::info("No ledger entries for this account");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Entry", "Transaction", "Type", "Amount", "Running", "Created"]);
    let mut running = 0i64;
    for entry in &entries {
        running += entry.signed_amount();
        table.add_row(vec![
            entry.id.to_string(),
            entry.transaction_id.to_string(),
            entry.entry_type.as_str().to_string(),
            format_minor(entry.signed_amount(), &account.currency),
            format_minor(running, &account.currency),
            entry.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn export(account: &str, output_path: PathBuf) -> Result<()> {
    let ctx = get_context(get_logger())?;
    let account_id = parse_account_id(account)?;

    let written = ctx.export_service.export_account(account_id, &output_path)?;
    output::success(&format!(
        "Exported {} entries to {}",
        written,
        output_path.display()
    ));
    Ok(())
}
