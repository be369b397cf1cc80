//! Account commands - open, list, inspect and manage accounts

use anyhow::{anyhow, Result};
use clap::Subcommand;
use colored::Colorize;
use uuid::Uuid;

use super::{get_context, get_logger, log_event};
use crate::output;
use coffer_core::domain::money::format_with_currency;
use coffer_core::services::Event;
use coffer_core::AccountStatus;

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account
    New {
        /// Owning user id
        #[arg(long)]
        user: String,
        /// ISO 4217 currency code (defaults to the configured currency)
        #[arg(long)]
        currency: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List accounts
    List {
        /// Only accounts owned by this user
        #[arg(long)]
        user: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show an account's derived balance
    Balance {
        /// Account id
        id: String,
        /// Calling user; when given, the read is ownership-checked
        #[arg(long)]
        user: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Freeze an account (blocks it from transfers)
    Freeze {
        /// Account id
        id: String,
    },

    /// Close an account permanently
    Close {
        /// Account id
        id: String,
    },
}

pub fn run(command: AccountCommands) -> Result<()> {
    match command {
        AccountCommands::New { user, currency, json } => new(&user, currency, json),
        AccountCommands::List { user, json } => list(user.as_deref(), json),
        AccountCommands::Balance { id, user, json } => balance(&id, user.as_deref(), json),
        AccountCommands::Freeze { id } => set_status(&id, AccountStatus::Frozen),
        AccountCommands::Close { id } => set_status(&id, AccountStatus::Closed),
    }
}

fn parse_account_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| anyhow!("Invalid account id: {id}"))
}

fn new(user: &str, currency: Option<String>, json: bool) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context(logger.clone())?;

    let currency = currency.unwrap_or_else(|| ctx.config.default_currency.clone());
    let account = ctx.account_service.open_account(user, &currency)?;

    log_event(&logger, Event::new("account_opened").with_command("account new"));

    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
        return Ok(());
    }
    output::success(&format!("Opened account {}", account.id));
    println!("Owner:    {}", account.user_id);
    println!("Currency: {}", account.currency);
    Ok(())
}

fn list(user: Option<&str>, json: bool) -> Result<()> {
    let ctx = get_context(get_logger())?;

    let accounts = match user {
        Some(u) => ctx.account_service.accounts_for_user(u)?,
        None => ctx.account_service.accounts()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&accounts)?);
        return Ok(());
    }

    if accounts.is_empty() {
        output::info("No accounts found");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Account", "Owner", "Kind", "Status", "Currency", "Balance"]);
    for account in &accounts {
        let balance = ctx.balance_service.balance_of(account.id)?;
        table.add_row(vec![
            account.id.to_string(),
            account.user_id.clone(),
            account.kind.as_str().to_string(),
            account.status.as_str().to_string(),
            account.currency.clone(),
            format_with_currency(balance, &account.currency),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn balance(id: &str, user: Option<&str>, json: bool) -> Result<()> {
    let ctx = get_context(get_logger())?;
    let account_id = parse_account_id(id)?;

    let account = ctx.account_service.resolve(account_id)?;
    let balance = match user {
        Some(caller) => ctx.account_service.balance_for_owner(account_id, caller)?,
        None => ctx.balance_service.balance_of(account_id)?,
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "account_id": account.id,
                "currency": account.currency,
                "balance_minor": balance,
            })
        );
        return Ok(());
    }
    println!(
        "{}: {}",
        account.id,
        format_with_currency(balance, &account.currency).bold()
    );
    Ok(())
}

fn set_status(id: &str, status: AccountStatus) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context(logger.clone())?;
    let account_id = parse_account_id(id)?;

    let account = ctx.account_service.set_status(account_id, status)?;

    log_event(
        &logger,
        Event::new("account_status_changed").with_command("account"),
    );
    output::success(&format!("Account {} is now {}", account.id, account.status.as_str()));
    Ok(())
}
