//! Result and error types for the core library
//!
//! Every failure a transfer can surface to a caller is a distinct variant
//! here. The transfer service recovers storage-level errors and translates
//! them into these kinds; nothing is swallowed except notification delivery.

use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed request: missing fields, non-positive amount, self-transfer.
    /// Rejected before any I/O.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An account id that does not resolve to a known account.
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    /// Account exists but is not ACTIVE.
    #[error("Account not active: {0}")]
    AccountInactive(String),

    /// Caller does not own the debited account.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Derived balance is below the requested amount.
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: i64, requested: i64 },

    /// No SYSTEM account provisioned. A configuration fault, not a client error.
    #[error("System account not provisioned")]
    SystemAccountMissing,

    /// The atomic unit of work could not be committed. Safe to retry:
    /// the idempotency key guarantees the retry cannot double-apply.
    #[error("Commit failed: {0}")]
    CommitFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid-account error
    pub fn invalid_account(msg: impl Into<String>) -> Self {
        Self::InvalidAccount(msg.into())
    }

    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Stable machine-readable kind, used by the event log and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::InvalidAccount(_) => "invalid_account",
            Self::AccountInactive(_) => "account_inactive",
            Self::Forbidden(_) => "forbidden",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::SystemAccountMissing => "system_account_missing",
            Self::CommitFailed(_) => "commit_failed",
            Self::NotFound(_) => "not_found",
            Self::Database(_) => "database",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }

    /// True when a storage error is a unique-constraint collision.
    ///
    /// The idempotency key carries a UNIQUE constraint in the schema; a
    /// collision here means a concurrent racer already created the
    /// transaction, and the caller should fall back to the lookup path.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(msg) => {
                let lower = msg.to_lowercase();
                lower.contains("duplicate key") || lower.contains("unique constraint")
            }
            _ => false,
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;
