//! Balance service - derives balances from the ledger
//!
//! Balances are never stored. Every balance is computed at request time
//! as the sum of CREDIT entries minus the sum of DEBIT entries for the
//! account, so the ledger is the single source of truth.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::Account;
use crate::ports::Repository;

/// A balance paired with its account
#[derive(Debug, Clone)]
pub struct AccountBalance {
    pub account: Account,
    pub balance: i64,
}

pub struct BalanceService {
    repository: Arc<dyn Repository>,
}

impl BalanceService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Current balance of an account, in minor units
    pub fn balance_of(&self, account_id: Uuid) -> Result<i64> {
        self.repository.balance_of(account_id)
    }

    /// Balances for all accounts
    pub fn account_balances(&self) -> Result<Vec<AccountBalance>> {
        let accounts = self.repository.accounts()?;
        let mut balances = Vec::with_capacity(accounts.len());
        for account in accounts {
            let balance = self.repository.balance_of(account.id)?;
            balances.push(AccountBalance { account, balance });
        }
        Ok(balances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DuckDbRepository;
    use crate::domain::{LedgerEntry, Transaction};
    use tempfile::TempDir;

    #[test]
    fn test_balance_reflects_entries() {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(DuckDbRepository::new(&dir.path().join("test.duckdb")).unwrap());
        repo.ensure_schema().unwrap();

        let account = Account::new("alice", "USD");
        let other = Account::new("bob", "USD");
        repo.add_account(&account).unwrap();
        repo.add_account(&other).unwrap();

        let tx = Transaction::new(other.id, account.id, 800, "seed");
        {
            let unit = repo.begin_transfer().unwrap();
            unit.insert_transaction(&tx).unwrap();
            unit.append_entry(&LedgerEntry::credit(account.id, tx.id, 500)).unwrap();
            unit.append_entry(&LedgerEntry::credit(account.id, tx.id, 300)).unwrap();
            unit.append_entry(&LedgerEntry::debit(account.id, tx.id, 200)).unwrap();
            unit.commit().unwrap();
        }

        let service = BalanceService::new(repo);
        assert_eq!(service.balance_of(account.id).unwrap(), 600);
        assert_eq!(service.balance_of(other.id).unwrap(), 0);

        let balances = service.account_balances().unwrap();
        assert_eq!(balances.len(), 2);
    }
}
