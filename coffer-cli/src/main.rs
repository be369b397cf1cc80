//! Coffer CLI - ledger-backed money movement in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{account, audit, fund, init, ledger, logs, query, status, transfer};

/// Coffer - ledger-backed money movement
#[derive(Parser)]
#[command(name = "coffer", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the coffer directory and provision the system account
    Init {
        /// Currency for the system account
        #[arg(long)]
        currency: Option<String>,
    },

    /// Manage accounts
    Account {
        #[command(subcommand)]
        command: account::AccountCommands,
    },

    /// Transfer funds between two accounts
    Transfer {
        /// Calling user (must own the source account)
        #[arg(long)]
        user: String,
        /// Source account id
        #[arg(long)]
        from: String,
        /// Target account id
        #[arg(long)]
        to: String,
        /// Amount in minor units (cents)
        #[arg(long)]
        amount: i64,
        /// Idempotency key; resubmitting a key replays the recorded outcome
        #[arg(long)]
        key: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Credit an account from the system account
    Fund {
        /// Target account id
        #[arg(long)]
        to: String,
        /// Amount in minor units (cents)
        #[arg(long)]
        amount: i64,
        /// Idempotency key
        #[arg(long)]
        key: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect and export ledger entries
    Ledger {
        #[command(subcommand)]
        command: ledger::LedgerCommands,
    },

    /// Show ledger status and summary
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run ledger consistency checks
    Audit {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Execute a read-only SQL query against the ledger database
    Query {
        /// SQL query to execute
        sql: Option<String>,
        /// Read SQL from file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recent events from the event log
    Logs {
        /// Maximum number of events to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Only show events that recorded a failure
        #[arg(long)]
        failures: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { currency } => init::run(currency),
        Commands::Account { command } => account::run(command),
        Commands::Transfer { user, from, to, amount, key, json } => {
            transfer::run(&user, &from, &to, amount, &key, json)
        }
        Commands::Fund { to, amount, key, json } => fund::run(&to, amount, &key, json),
        Commands::Ledger { command } => ledger::run(command),
        Commands::Status { json } => status::run(json),
        Commands::Audit { json } => audit::run(json),
        Commands::Query { sql, file, json } => query::run(sql.as_deref(), file.as_deref(), json),
        Commands::Logs { limit, failures, json } => logs::run(limit, failures, json),
    }
}
