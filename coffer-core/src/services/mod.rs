//! Services - business logic built on the ports

pub mod account;
pub mod audit;
pub mod balance;
pub mod export;
pub mod idempotency;
pub mod logging;
pub mod migration;
pub mod query;
pub mod status;
pub mod transfer;

pub use account::AccountService;
pub use audit::{AuditCheck, AuditReport, AuditService, CheckStatus};
pub use balance::{AccountBalance, BalanceService};
pub use export::ExportService;
pub use idempotency::IdempotencyGuard;
pub use logging::{Event, LoggingService, StoredEvent};
pub use migration::{MigrationResult, MigrationService};
pub use query::QueryService;
pub use status::{StatusService, StatusSummary};
pub use transfer::TransferService;
