//! Status command - ledger summary

use anyhow::Result;
use colored::Colorize;

use super::{get_context, get_logger};
use crate::output;
use coffer_core::domain::money::format_with_currency;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context(get_logger())?;
    let summary = ctx.status_service.summary()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "Coffer Status".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Database", &summary.db_path.display().to_string()]);
    table.add_row(vec!["Accounts", &summary.account_count.to_string()]);
    table.add_row(vec!["Transactions", &summary.transaction_count.to_string()]);
    table.add_row(vec!["Ledger entries", &summary.entry_count.to_string()]);
    println!("{table}");
    println!();

    if !summary.has_system_account {
        output::warning("No system account provisioned; run `coffer init` first");
        return Ok(());
    }

    if !summary.balances.is_empty() {
        println!("{}", "Balances".bold());
        let mut table = output::create_table();
        table.set_header(vec!["Account", "Owner", "Balance"]);
        for ab in &summary.balances {
            table.add_row(vec![
                ab.account.id.to_string(),
                ab.account.user_id.clone(),
                format_with_currency(ab.balance, &ab.account.currency),
            ]);
        }
        println!("{table}");
    }
    Ok(())
}
