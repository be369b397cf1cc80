//! Audit service - consistency checks over the ledger
//!
//! Each check verifies an invariant the write path is supposed to
//! maintain. A failing check means the ledger was modified outside the
//! transfer protocol or a bug slipped through it.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::result::Result;
use crate::ports::Repository;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warning,
    Error,
}

/// Result of a single audit check
#[derive(Debug, Serialize)]
pub struct AuditCheck {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
    pub offenders: Vec<String>,
}

impl AuditCheck {
    fn pass(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            detail: detail.into(),
            offenders: Vec::new(),
        }
    }

    fn fail(name: &str, status: CheckStatus, detail: impl Into<String>, offenders: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            detail: detail.into(),
            offenders,
        }
    }
}

/// Full audit report
#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub checks: Vec<AuditCheck>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.checks.iter().all(|c| c.status == CheckStatus::Pass)
    }

    pub fn has_errors(&self) -> bool {
        self.checks.iter().any(|c| c.status == CheckStatus::Error)
    }
}

pub struct AuditService {
    repository: Arc<dyn Repository>,
}

impl AuditService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Run all consistency checks
    pub fn run_checks(&self) -> Result<AuditReport> {
        let mut checks = Vec::new();

        let unbalanced = self.repository.unbalanced_transactions()?;
        checks.push(if unbalanced.is_empty() {
            AuditCheck::pass(
                "double_entry",
                "every completed transaction has a matched debit/credit pair",
            )
        } else {
            AuditCheck::fail(
                "double_entry",
                CheckStatus::Error,
                format!("{} completed transaction(s) without a matched entry pair", unbalanced.len()),
                unbalanced,
            )
        });

        let orphans = self.repository.orphaned_entries()?;
        checks.push(if orphans.is_empty() {
            AuditCheck::pass("orphaned_entries", "every entry references a known transaction and account")
        } else {
            AuditCheck::fail(
                "orphaned_entries",
                CheckStatus::Error,
                format!("{} entry(ies) reference a missing transaction or account", orphans.len()),
                orphans,
            )
        });

        let nonpositive = self.repository.nonpositive_amounts()?;
        checks.push(if nonpositive.is_empty() {
            AuditCheck::pass("positive_amounts", "every recorded amount is positive")
        } else {
            AuditCheck::fail(
                "positive_amounts",
                CheckStatus::Error,
                format!("{} record(s) carry a non-positive amount", nonpositive.len()),
                nonpositive,
            )
        });

        let negatives = self.repository.negative_user_balances()?;
        checks.push(if negatives.is_empty() {
            AuditCheck::pass("negative_balances", "no user account is overdrawn")
        } else {
            AuditCheck::fail(
                "negative_balances",
                CheckStatus::Warning,
                format!("{} user account(s) have a negative balance", negatives.len()),
                negatives,
            )
        });

        Ok(AuditReport { checks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DuckDbRepository;
    use crate::domain::{Account, LedgerEntry, Transaction};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<DuckDbRepository>) {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(DuckDbRepository::new(&dir.path().join("test.duckdb")).unwrap());
        repo.ensure_schema().unwrap();
        (dir, repo)
    }

    #[test]
    fn test_clean_ledger_passes_all_checks() {
        let (_dir, repo) = setup();

        let from = Account::new("alice", "USD");
        let to = Account::new("bob", "USD");
        repo.add_account(&from).unwrap();
        repo.add_account(&to).unwrap();

        let tx = Transaction::new(from.id, to.id, 100, "k1");
        {
            let unit = repo.begin_transfer().unwrap();
            unit.insert_transaction(&tx).unwrap();
            unit.append_entry(&LedgerEntry::credit(to.id, tx.id, 100)).unwrap();
            unit.append_entry(&LedgerEntry::debit(from.id, tx.id, 100)).unwrap();
            unit.complete_transaction(tx.id).unwrap();
            unit.commit().unwrap();
        }

        let report = AuditService::new(repo).run_checks().unwrap();
        assert!(report.is_clean(), "report: {report:?}");
    }

    #[test]
    fn test_unbalanced_transaction_is_flagged() {
        let (_dir, repo) = setup();

        let from = Account::new("alice", "USD");
        let to = Account::new("bob", "USD");
        repo.add_account(&from).unwrap();
        repo.add_account(&to).unwrap();

        // Completed transaction with only the credit side written
        let tx = Transaction::new(from.id, to.id, 100, "k1");
        {
            let unit = repo.begin_transfer().unwrap();
            unit.insert_transaction(&tx).unwrap();
            unit.append_entry(&LedgerEntry::credit(to.id, tx.id, 100)).unwrap();
            unit.complete_transaction(tx.id).unwrap();
            unit.commit().unwrap();
        }

        let report = AuditService::new(repo).run_checks().unwrap();
        assert!(report.has_errors());
        let check = report.checks.iter().find(|c| c.name == "double_entry").unwrap();
        assert_eq!(check.status, CheckStatus::Error);
        assert_eq!(check.offenders, vec![tx.id.to_string()]);
    }

    #[test]
    fn test_system_account_negative_balance_is_allowed() {
        let (_dir, repo) = setup();

        let system = Account::system("USD");
        let alice = Account::new("alice", "USD");
        repo.add_account(&system).unwrap();
        repo.add_account(&alice).unwrap();

        let tx = Transaction::new(system.id, alice.id, 500, "fund");
        {
            let unit = repo.begin_transfer().unwrap();
            unit.insert_transaction(&tx).unwrap();
            unit.append_entry(&LedgerEntry::credit(alice.id, tx.id, 500)).unwrap();
            unit.append_entry(&LedgerEntry::debit(system.id, tx.id, 500)).unwrap();
            unit.complete_transaction(tx.id).unwrap();
            unit.commit().unwrap();
        }

        let report = AuditService::new(repo).run_checks().unwrap();
        let check = report.checks.iter().find(|c| c.name == "negative_balances").unwrap();
        assert_eq!(check.status, CheckStatus::Pass);
    }
}
