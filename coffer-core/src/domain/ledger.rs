//! Ledger entry domain model
//!
//! Ledger entries are the immutable audit trail. There is deliberately no
//! way to change or remove one: the storage port exposes only append and
//! query operations, so a mutation cannot even be expressed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Double-entry side. Every completed transaction produces exactly one
/// DEBIT against the source account and one CREDIT against the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    Debit,
    Credit,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Debit => "DEBIT",
            EntryType::Credit => "CREDIT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DEBIT" => Some(EntryType::Debit),
            "CREDIT" => Some(EntryType::Credit),
            _ => None,
        }
    }
}

/// One side of a double-entry record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub account_id: Uuid,
    pub transaction_id: Uuid,
    pub entry_type: EntryType,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    fn new(account_id: Uuid, transaction_id: Uuid, entry_type: EntryType, amount: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            transaction_id,
            entry_type,
            amount,
            created_at: Utc::now(),
        }
    }

    /// Entry debiting `account_id` for a transaction
    pub fn debit(account_id: Uuid, transaction_id: Uuid, amount: i64) -> Self {
        Self::new(account_id, transaction_id, EntryType::Debit, amount)
    }

    /// Entry crediting `account_id` for a transaction
    pub fn credit(account_id: Uuid, transaction_id: Uuid, amount: i64) -> Self {
        Self::new(account_id, transaction_id, EntryType::Credit, amount)
    }

    /// Signed contribution of this entry to its account's balance
    pub fn signed_amount(&self) -> i64 {
        match self.entry_type {
            EntryType::Credit => self.amount,
            EntryType::Debit => -self.amount,
        }
    }
}
