//! Transaction domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transaction lifecycle.
///
/// PENDING and COMPLETED both happen inside the same atomic unit of work,
/// so an observer never sees a PENDING transaction with ledger entries.
/// REVERSED is a valid terminal state reserved for future compensating
/// transfers; this core never produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Reversed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Reversed => "REVERSED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(TransactionStatus::Pending),
            "COMPLETED" => Some(TransactionStatus::Completed),
            "FAILED" => Some(TransactionStatus::Failed),
            "REVERSED" => Some(TransactionStatus::Reversed),
            _ => None,
        }
    }
}

/// A transfer between two accounts, recorded forever
///
/// Amounts are integer minor currency units. The idempotency key is
/// caller-supplied and carries a storage-enforced UNIQUE constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub from_account: Uuid,
    pub to_account: Uuid,
    pub amount: i64,
    pub idempotency_key: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new pending transaction
    pub fn new(from_account: Uuid, to_account: Uuid, amount: i64, idempotency_key: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            from_account,
            to_account,
            amount,
            idempotency_key: idempotency_key.to_string(),
            status: TransactionStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// What a transfer call hands back to the caller
///
/// A replayed idempotency key is a success, not an error: the prior
/// transaction comes back verbatim with `already_processed` set, so
/// clients can tell a replay from a fresh commit without treating it
/// differently for correctness.
#[derive(Debug, Clone, Serialize)]
pub struct TransferOutcome {
    pub transaction: Transaction,
    pub already_processed: bool,
}

impl TransferOutcome {
    pub fn fresh(transaction: Transaction) -> Self {
        Self { transaction, already_processed: false }
    }

    pub fn replayed(transaction: Transaction) -> Self {
        Self { transaction, already_processed: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction_is_pending() {
        let tx = Transaction::new(Uuid::new_v4(), Uuid::new_v4(), 1500, "key-1");
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.amount, 1500);
        assert_eq!(tx.idempotency_key, "key-1");
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Completed,
            TransactionStatus::Failed,
            TransactionStatus::Reversed,
        ] {
            assert_eq!(TransactionStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_outcome_flags() {
        let tx = Transaction::new(Uuid::new_v4(), Uuid::new_v4(), 100, "k");
        assert!(!TransferOutcome::fresh(tx.clone()).already_processed);
        assert!(TransferOutcome::replayed(tx).already_processed);
    }
}
