//! Export service - writes an account's ledger history to CSV

use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::money::format_minor;
use crate::ports::Repository;

pub struct ExportService {
    repository: Arc<dyn Repository>,
}

impl ExportService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Write all ledger entries for an account to a CSV file.
    ///
    /// Returns the number of entries written. Amounts are formatted in
    /// the account's currency alongside the raw minor units, and a
    /// running balance column tracks the account over time.
    pub fn export_account(&self, account_id: Uuid, output: &Path) -> Result<usize> {
        let account = self
            .repository
            .account_by_id(account_id)?
            .ok_or_else(|| Error::invalid_account(account_id.to_string()))?;
        let entries = self.repository.entries_by_account(account_id)?;

        let mut writer = csv::Writer::from_path(output)
            .map_err(|e| Error::database(format!("failed to open {}: {e}", output.display())))?;

        writer
            .write_record([
                "entry_id",
                "transaction_id",
                "type",
                "amount_minor",
                "amount",
                "running_balance",
                "created_at",
            ])
            .map_err(|e| Error::database(e.to_string()))?;

        let mut running = 0i64;
        for entry in &entries {
            running += entry.signed_amount();
            writer
                .write_record([
                    entry.id.to_string(),
                    entry.transaction_id.to_string(),
                    entry.entry_type.as_str().to_string(),
                    entry.amount.to_string(),
                    format_minor(entry.signed_amount(), &account.currency),
                    format_minor(running, &account.currency),
                    entry.created_at.to_rfc3339(),
                ])
                .map_err(|e| Error::database(e.to_string()))?;
        }

        writer.flush()?;
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DuckDbRepository;
    use crate::domain::{Account, LedgerEntry, Transaction};
    use tempfile::TempDir;

    #[test]
    fn test_export_writes_entries_with_running_balance() {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(DuckDbRepository::new(&dir.path().join("test.duckdb")).unwrap());
        repo.ensure_schema().unwrap();

        let alice = Account::new("alice", "USD");
        let bob = Account::new("bob", "USD");
        repo.add_account(&alice).unwrap();
        repo.add_account(&bob).unwrap();

        let tx = Transaction::new(bob.id, alice.id, 500, "k1");
        {
            let unit = repo.begin_transfer().unwrap();
            unit.insert_transaction(&tx).unwrap();
            unit.append_entry(&LedgerEntry::credit(alice.id, tx.id, 500)).unwrap();
            unit.append_entry(&LedgerEntry::debit(bob.id, tx.id, 500)).unwrap();
            unit.commit().unwrap();
        }

        let output = dir.path().join("alice.csv");
        let written = ExportService::new(repo).export_account(alice.id, &output).unwrap();
        assert_eq!(written, 1);

        let contents = std::fs::read_to_string(&output).unwrap();
        assert!(contents.starts_with("entry_id,"));
        assert!(contents.contains("CREDIT"));
        assert!(contents.contains("5.00"));
    }

    #[test]
    fn test_export_unknown_account_fails() {
        let dir = TempDir::new().unwrap();
        let repo = Arc::new(DuckDbRepository::new(&dir.path().join("test.duckdb")).unwrap());
        repo.ensure_schema().unwrap();

        let err = ExportService::new(repo)
            .export_account(Uuid::new_v4(), &dir.path().join("out.csv"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAccount(_)));
    }
}
