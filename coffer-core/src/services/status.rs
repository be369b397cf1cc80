//! Status service - summary of the ledger state

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::result::Result;
use crate::ports::Repository;
use crate::services::balance::{AccountBalance, BalanceService};

/// Snapshot of the ledger for the status command
#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub db_path: PathBuf,
    pub account_count: i64,
    pub transaction_count: i64,
    pub entry_count: i64,
    pub has_system_account: bool,
    #[serde(skip)]
    pub balances: Vec<AccountBalance>,
}

pub struct StatusService {
    repository: Arc<dyn Repository>,
    balances: Arc<BalanceService>,
    db_path: PathBuf,
}

impl StatusService {
    pub fn new(repository: Arc<dyn Repository>, balances: Arc<BalanceService>, db_path: PathBuf) -> Self {
        Self {
            repository,
            balances,
            db_path,
        }
    }

    pub fn summary(&self) -> Result<StatusSummary> {
        Ok(StatusSummary {
            db_path: self.db_path.clone(),
            account_count: self.repository.account_count()?,
            transaction_count: self.repository.transaction_count()?,
            entry_count: self.repository.entry_count()?,
            has_system_account: self.repository.system_account()?.is_some(),
            balances: self.balances.account_balances()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DuckDbRepository;
    use crate::domain::Account;
    use tempfile::TempDir;

    #[test]
    fn test_summary_counts() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.duckdb");
        let repo = Arc::new(DuckDbRepository::new(&db_path).unwrap());
        repo.ensure_schema().unwrap();

        repo.add_account(&Account::system("USD")).unwrap();
        repo.add_account(&Account::new("alice", "USD")).unwrap();

        let repository: Arc<dyn Repository> = repo;
        let balances = Arc::new(BalanceService::new(Arc::clone(&repository)));
        let service = StatusService::new(repository, balances, db_path);

        let summary = service.summary().unwrap();
        assert_eq!(summary.account_count, 2);
        assert_eq!(summary.transaction_count, 0);
        assert_eq!(summary.entry_count, 0);
        assert!(summary.has_system_account);
        assert_eq!(summary.balances.len(), 2);
    }
}
