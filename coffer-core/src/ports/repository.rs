//! Repository port - storage abstraction
//!
//! The ledger surface is append-and-query only. No update or delete
//! operation on ledger entries exists anywhere in this interface, so
//! violating ledger immutability is a compile-time impossibility rather
//! than a runtime-rejected operation.

use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Account, AccountStatus, LedgerEntry, Transaction};

/// Storage abstraction over accounts, transactions, and the ledger
pub trait Repository: Send + Sync {
    // === Accounts ===

    /// Add a new account
    fn add_account(&self, account: &Account) -> Result<()>;

    /// Get account by id
    fn account_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    /// Get all accounts
    fn accounts(&self) -> Result<Vec<Account>>;

    /// Get all accounts owned by a user
    fn accounts_for_user(&self, user_id: &str) -> Result<Vec<Account>>;

    /// Get the singular SYSTEM account, if provisioned
    fn system_account(&self) -> Result<Option<Account>>;

    /// Update an account's lifecycle status. Account rows are the only
    /// mutable records; the ledger below them never changes.
    fn update_account_status(&self, id: Uuid, status: AccountStatus) -> Result<()>;

    // === Transactions ===

    /// Get transaction by id
    fn transaction_by_id(&self, id: Uuid) -> Result<Option<Transaction>>;

    /// Get transaction by idempotency key.
    ///
    /// This is the fast-path duplicate check. The UNIQUE constraint on the
    /// key column is the actual correctness mechanism for races.
    fn transaction_by_idempotency_key(&self, key: &str) -> Result<Option<Transaction>>;

    /// Get transactions touching an account, newest first
    fn transactions_for_account(&self, account_id: Uuid) -> Result<Vec<Transaction>>;

    // === Ledger (read side) ===

    /// Entries for an account, oldest first
    fn entries_by_account(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>>;

    /// Entries referencing a transaction
    fn entries_by_transaction(&self, transaction_id: Uuid) -> Result<Vec<LedgerEntry>>;

    /// Derived balance: sum of credits minus sum of debits.
    /// An account with no entries has balance 0.
    fn balance_of(&self, account_id: Uuid) -> Result<i64>;

    // === Counts ===

    fn account_count(&self) -> Result<i64>;
    fn transaction_count(&self) -> Result<i64>;
    fn entry_count(&self) -> Result<i64>;

    // === Unit of work ===

    /// Open an isolated unit of work for one transfer.
    ///
    /// All reads and writes made through the returned unit share one
    /// consistency snapshot: the funds check and the double-entry writes
    /// cannot interleave with another caller's. Dropping the unit without
    /// committing rolls everything back.
    fn begin_transfer(&self) -> Result<Box<dyn TransferUnit + '_>>;

    // === Audit queries ===

    /// COMPLETED transactions whose ledger pairing is wrong: not exactly
    /// one DEBIT and one CREDIT, or amounts that disagree with the
    /// transaction. Returns transaction ids.
    fn unbalanced_transactions(&self) -> Result<Vec<String>>;

    /// Ledger entries referencing a missing account or transaction.
    /// Returns entry ids.
    fn orphaned_entries(&self) -> Result<Vec<String>>;

    /// Non-SYSTEM accounts whose derived balance is negative.
    /// Returns `account_id:balance` pairs.
    fn negative_user_balances(&self) -> Result<Vec<String>>;

    /// Transactions or entries recorded with amount <= 0. The schema's
    /// CHECK constraints make these unreachable through this adapter;
    /// a hit means the database was written by something else.
    fn nonpositive_amounts(&self) -> Result<Vec<String>>;

    // === Ad-hoc queries ===

    /// Execute a read-only SQL query. Write statements are rejected.
    fn execute_query(&self, sql: &str) -> Result<QueryResult>;
}

/// One transfer's atomic unit of work
///
/// Everything between `begin_transfer` and `commit` either persists as a
/// whole or not at all. The funds check in `balance_of` reads the same
/// snapshot the writes go into, closing the check-then-write overdraft
/// window.
pub trait TransferUnit {
    /// Derived balance inside this unit's snapshot
    fn balance_of(&self, account_id: Uuid) -> Result<i64>;

    /// Insert a PENDING transaction. Fails with a unique-constraint
    /// violation if a racer already claimed the idempotency key.
    fn insert_transaction(&self, tx: &Transaction) -> Result<()>;

    /// Append one ledger entry
    fn append_entry(&self, entry: &LedgerEntry) -> Result<()>;

    /// Mark the transaction COMPLETED
    fn complete_transaction(&self, id: Uuid) -> Result<()>;

    /// Commit the unit. Consumes it; an uncommitted unit rolls back on drop.
    fn commit(self: Box<Self>) -> Result<()>;
}

/// Result of a read-only SQL query
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}
