//! Coffer Core - ledger-backed money movement
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Account, Transaction, LedgerEntry)
//! - **ports**: Trait definitions for external dependencies (Repository, Notifier)
//! - **services**: Business logic orchestration
//! - **adapters**: Concrete implementations (DuckDB, webhook delivery)
//!
//! All money moves through transfers: a transaction row plus one CREDIT
//! and one DEBIT ledger entry, committed atomically. Balances are derived
//! from the ledger at request time and never stored.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use adapters::duckdb::DuckDbRepository;
use adapters::webhook::WebhookNotifier;
use config::Config;
use ports::{Notifier, NullNotifier, Repository};
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{
    Account, AccountKind, AccountStatus, EntryType, LedgerEntry, Transaction, TransactionStatus,
    TransferOutcome,
};
pub use ports::QueryResult;

/// Name of the ledger database file inside the coffer directory
pub const LEDGER_DB_FILE: &str = "coffer.duckdb";

/// Main context for Coffer operations
///
/// This is the primary entry point for all business logic. It holds the
/// database connection, configuration, and all services.
pub struct CofferContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub account_service: Arc<AccountService>,
    pub balance_service: Arc<BalanceService>,
    pub transfer_service: TransferService,
    pub status_service: StatusService,
    pub audit_service: AuditService,
    pub query_service: QueryService,
    pub export_service: ExportService,
}

impl CofferContext {
    /// Create a new Coffer context
    ///
    /// Opens the ledger database, runs pending migrations, and wires the
    /// services. When `events` is given, the transfer service records
    /// notification outcomes to it.
    pub fn new(coffer_dir: &Path, events: Option<Arc<LoggingService>>) -> Result<Self> {
        let config = Config::load(coffer_dir)?;

        let db_path = coffer_dir.join(LEDGER_DB_FILE);
        let repository = Arc::new(DuckDbRepository::new(&db_path)?);
        repository.ensure_schema()?;

        let repo: Arc<dyn Repository> = Arc::clone(&repository) as Arc<dyn Repository>;

        let notifier: Arc<dyn Notifier> = match &config.webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url.clone())?),
            None => Arc::new(NullNotifier),
        };

        let account_service = Arc::new(AccountService::new(Arc::clone(&repo)));
        let balance_service = Arc::new(BalanceService::new(Arc::clone(&repo)));
        let transfer_service = TransferService::new(
            Arc::clone(&repo),
            Arc::clone(&account_service),
            notifier,
            events,
        );
        let status_service =
            StatusService::new(Arc::clone(&repo), Arc::clone(&balance_service), db_path);
        let audit_service = AuditService::new(Arc::clone(&repo));
        let query_service = QueryService::new(Arc::clone(&repo));
        let export_service = ExportService::new(Arc::clone(&repo));

        Ok(Self {
            config,
            repository,
            account_service,
            balance_service,
            transfer_service,
            status_service,
            audit_service,
            query_service,
            export_service,
        })
    }
}
