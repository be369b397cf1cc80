//! Idempotency guard - duplicate-submission detection
//!
//! The lookup here is only a fast path. The authority for duplicate
//! detection is the UNIQUE constraint on transactions.idempotency_key;
//! a race that slips past the lookup is caught at insert time and
//! resolved by looking the key up again.

use std::sync::Arc;

use crate::domain::result::{Error, Result};
use crate::domain::Transaction;
use crate::ports::Repository;

pub struct IdempotencyGuard {
    repository: Arc<dyn Repository>,
}

impl IdempotencyGuard {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Find the transaction already recorded under this key, if any
    pub fn lookup(&self, key: &str) -> Result<Option<Transaction>> {
        if key.trim().is_empty() {
            return Err(Error::validation("idempotency key must not be empty"));
        }
        self.repository.transaction_by_idempotency_key(key)
    }
}
