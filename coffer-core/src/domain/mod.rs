//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod ledger;
pub mod money;
pub mod result;
mod transaction;

pub use account::{Account, AccountKind, AccountStatus};
pub use ledger::{EntryType, LedgerEntry};
pub use transaction::{Transaction, TransactionStatus, TransferOutcome};
