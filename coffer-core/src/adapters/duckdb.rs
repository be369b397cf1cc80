//! DuckDB repository implementation
//!
//! A single connection behind a mutex backs all operations. A transfer's
//! unit of work holds the mutex guard for its whole lifetime, so the funds
//! check and the double-entry writes run against one snapshot and
//! concurrent transfers serialize at the connection.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{params, Connection};
use sqlparser::ast::Statement;
use sqlparser::dialect::DuckDbDialect;
use sqlparser::parser::Parser;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    Account, AccountKind, AccountStatus, EntryType, LedgerEntry, Transaction, TransactionStatus,
};
use crate::ports::{QueryResult, Repository, TransferUnit};
use crate::services::MigrationService;

impl From<duckdb::Error> for Error {
    fn from(e: duckdb::Error) -> Self {
        Error::Database(e.to_string())
    }
}

/// Maximum number of retries when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue worth retrying
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

/// DuckDB-backed repository
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Open (or create) the database at `db_path`.
    ///
    /// Retries with exponential backoff on file-lock errors, which can
    /// happen when another process holds the database during startup.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[coffer] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error
            .map(Into::into)
            .unwrap_or_else(|| Error::database("failed to open database")))
    }

    fn try_open_connection(db_path: &Path) -> duckdb::Result<Connection> {
        // Extension autoloading is off: nothing here needs extensions and
        // cached ones can fail code signing on macOS.
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Connection::open_with_flags(db_path, config)
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        MigrationService::new(&conn).run_pending()?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::database("connection lock poisoned"))
    }

    // === Row mapping ===

    fn row_to_account(row: &duckdb::Row) -> duckdb::Result<Account> {
        let id: String = row.get(0)?;
        let kind: String = row.get(2)?;
        let status: String = row.get(3)?;
        let created: String = row.get(5)?;
        let updated: String = row.get(6)?;

        Ok(Account {
            id: parse_uuid(0, &id)?,
            user_id: row.get(1)?,
            kind: AccountKind::parse(&kind)
                .ok_or_else(|| conversion_error(2, format!("unknown account kind {kind:?}")))?,
            status: AccountStatus::parse(&status)
                .ok_or_else(|| conversion_error(3, format!("unknown account status {status:?}")))?,
            currency: row.get(4)?,
            created_at: parse_timestamp(5, &created)?,
            updated_at: parse_timestamp(6, &updated)?,
        })
    }

    fn row_to_transaction(row: &duckdb::Row) -> duckdb::Result<Transaction> {
        let id: String = row.get(0)?;
        let from: String = row.get(1)?;
        let to: String = row.get(2)?;
        let status: String = row.get(5)?;
        let created: String = row.get(6)?;
        let updated: String = row.get(7)?;

        Ok(Transaction {
            id: parse_uuid(0, &id)?,
            from_account: parse_uuid(1, &from)?,
            to_account: parse_uuid(2, &to)?,
            amount: row.get(3)?,
            idempotency_key: row.get(4)?,
            status: TransactionStatus::parse(&status).ok_or_else(|| {
                conversion_error(5, format!("unknown transaction status {status:?}"))
            })?,
            created_at: parse_timestamp(6, &created)?,
            updated_at: parse_timestamp(7, &updated)?,
        })
    }

    fn row_to_entry(row: &duckdb::Row) -> duckdb::Result<LedgerEntry> {
        let id: String = row.get(0)?;
        let account: String = row.get(1)?;
        let transaction: String = row.get(2)?;
        let entry_type: String = row.get(3)?;
        let created: String = row.get(5)?;

        Ok(LedgerEntry {
            id: parse_uuid(0, &id)?,
            account_id: parse_uuid(1, &account)?,
            transaction_id: parse_uuid(2, &transaction)?,
            entry_type: EntryType::parse(&entry_type)
                .ok_or_else(|| conversion_error(3, format!("unknown entry type {entry_type:?}")))?,
            amount: row.get(4)?,
            created_at: parse_timestamp(5, &created)?,
        })
    }

    fn string_list(&self, sql: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }
}

const ACCOUNT_COLUMNS: &str = "account_id, user_id, kind, status, currency, \
     created_at::VARCHAR, updated_at::VARCHAR";

const TRANSACTION_COLUMNS: &str = "transaction_id, from_account, to_account, amount, \
     idempotency_key, status, created_at::VARCHAR, updated_at::VARCHAR";

const ENTRY_COLUMNS: &str =
    "entry_id, account_id, transaction_id, entry_type, amount, created_at::VARCHAR";

/// CREDIT minus DEBIT over an account's entries, 0 when there are none
const BALANCE_SQL: &str = "SELECT CAST(COALESCE(SUM(CASE WHEN entry_type = 'CREDIT' \
     THEN amount ELSE -amount END), 0) AS BIGINT) \
     FROM ledger_entries WHERE account_id = ?";

fn balance_on(conn: &Connection, account_id: Uuid) -> Result<i64> {
    let balance: i64 =
        conn.query_row(BALANCE_SQL, params![account_id.to_string()], |row| row.get(0))?;
    Ok(balance)
}

impl Repository for DuckDbRepository {
    // === Accounts ===

    fn add_account(&self, account: &Account) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO accounts (account_id, user_id, kind, status, currency, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                account.id.to_string(),
                account.user_id,
                account.kind.as_str(),
                account.status.as_str(),
                account.currency,
                timestamp_param(account.created_at),
                timestamp_param(account.updated_at),
            ],
        )?;
        Ok(())
    }

    fn account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?"
        ))?;
        let mut rows = stmt.query_map(params![id.to_string()], Self::row_to_account)?;
        rows.next().transpose().map_err(Into::into)
    }

    fn accounts(&self) -> Result<Vec<Account>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at"
        ))?;
        let rows = stmt.query_map([], Self::row_to_account)?;
        rows.collect::<duckdb::Result<Vec<_>>>().map_err(Into::into)
    }

    fn accounts_for_user(&self, user_id: &str) -> Result<Vec<Account>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE user_id = ? ORDER BY created_at"
        ))?;
        let rows = stmt.query_map(params![user_id], Self::row_to_account)?;
        rows.collect::<duckdb::Result<Vec<_>>>().map_err(Into::into)
    }

    fn system_account(&self) -> Result<Option<Account>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE kind = 'SYSTEM' LIMIT 1"
        ))?;
        let mut rows = stmt.query_map([], Self::row_to_account)?;
        rows.next().transpose().map_err(Into::into)
    }

    fn update_account_status(&self, id: Uuid, status: AccountStatus) -> Result<()> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE accounts SET status = ?, updated_at = ? WHERE account_id = ?",
            params![
                status.as_str(),
                timestamp_param(Utc::now()),
                id.to_string()
            ],
        )?;
        if changed == 0 {
            return Err(Error::invalid_account(id.to_string()));
        }
        Ok(())
    }

    // === Transactions ===

    fn transaction_by_id(&self, id: Uuid) -> Result<Option<Transaction>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE transaction_id = ?"
        ))?;
        let mut rows = stmt.query_map(params![id.to_string()], Self::row_to_transaction)?;
        rows.next().transpose().map_err(Into::into)
    }

    fn transaction_by_idempotency_key(&self, key: &str) -> Result<Option<Transaction>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE idempotency_key = ?"
        ))?;
        let mut rows = stmt.query_map(params![key], Self::row_to_transaction)?;
        rows.next().transpose().map_err(Into::into)
    }

    fn transactions_for_account(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE from_account = ? OR to_account = ? ORDER BY created_at DESC"
        ))?;
        let id = account_id.to_string();
        let rows = stmt.query_map(params![id, id], Self::row_to_transaction)?;
        rows.collect::<duckdb::Result<Vec<_>>>().map_err(Into::into)
    }

    // === Ledger (read side) ===

    fn entries_by_account(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE account_id = ? ORDER BY created_at"
        ))?;
        let rows = stmt.query_map(params![account_id.to_string()], Self::row_to_entry)?;
        rows.collect::<duckdb::Result<Vec<_>>>().map_err(Into::into)
    }

    fn entries_by_transaction(&self, transaction_id: Uuid) -> Result<Vec<LedgerEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE transaction_id = ? ORDER BY created_at"
        ))?;
        let rows = stmt.query_map(params![transaction_id.to_string()], Self::row_to_entry)?;
        rows.collect::<duckdb::Result<Vec<_>>>().map_err(Into::into)
    }

    fn balance_of(&self, account_id: Uuid) -> Result<i64> {
        let conn = self.lock()?;
        balance_on(&conn, account_id)
    }

    // === Counts ===

    fn account_count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count = conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?;
        Ok(count)
    }

    fn transaction_count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
        Ok(count)
    }

    fn entry_count(&self) -> Result<i64> {
        let conn = self.lock()?;
        let count = conn.query_row("SELECT COUNT(*) FROM ledger_entries", [], |row| row.get(0))?;
        Ok(count)
    }

    // === Unit of work ===

    fn begin_transfer(&self) -> Result<Box<dyn TransferUnit + '_>> {
        let conn = self.lock()?;
        conn.execute_batch("BEGIN TRANSACTION")?;
        Ok(Box::new(DuckDbTransferUnit { conn, open: true }))
    }

    // === Audit queries ===

    fn unbalanced_transactions(&self) -> Result<Vec<String>> {
        self.string_list(
            "SELECT t.transaction_id FROM transactions t
             WHERE t.status = 'COMPLETED' AND (
                 (SELECT COUNT(*) FROM ledger_entries e
                  WHERE e.transaction_id = t.transaction_id AND e.entry_type = 'DEBIT') != 1
                 OR (SELECT COUNT(*) FROM ledger_entries e
                     WHERE e.transaction_id = t.transaction_id AND e.entry_type = 'CREDIT') != 1
                 OR (SELECT CAST(COALESCE(SUM(e.amount), 0) AS BIGINT) FROM ledger_entries e
                     WHERE e.transaction_id = t.transaction_id AND e.entry_type = 'DEBIT') != t.amount
                 OR (SELECT CAST(COALESCE(SUM(e.amount), 0) AS BIGINT) FROM ledger_entries e
                     WHERE e.transaction_id = t.transaction_id AND e.entry_type = 'CREDIT') != t.amount
             )",
        )
    }

    fn orphaned_entries(&self) -> Result<Vec<String>> {
        self.string_list(
            "SELECT e.entry_id FROM ledger_entries e
             LEFT JOIN transactions t ON t.transaction_id = e.transaction_id
             LEFT JOIN accounts a ON a.account_id = e.account_id
             WHERE t.transaction_id IS NULL OR a.account_id IS NULL",
        )
    }

    fn negative_user_balances(&self) -> Result<Vec<String>> {
        self.string_list(
            "SELECT a.account_id || ':' || CAST(b.balance AS VARCHAR)
             FROM accounts a
             JOIN (SELECT account_id,
                          CAST(SUM(CASE WHEN entry_type = 'CREDIT' THEN amount ELSE -amount END)
                               AS BIGINT) AS balance
                   FROM ledger_entries GROUP BY account_id) b
               ON b.account_id = a.account_id
             WHERE a.kind != 'SYSTEM' AND b.balance < 0",
        )
    }

    fn nonpositive_amounts(&self) -> Result<Vec<String>> {
        self.string_list(
            "SELECT 'transaction:' || transaction_id FROM transactions WHERE amount <= 0
             UNION ALL
             SELECT 'entry:' || entry_id FROM ledger_entries WHERE amount <= 0",
        )
    }

    // === Ad-hoc queries ===

    fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        // The ledger is immutable: the only raw-SQL surface accepts pure
        // SELECT statements. Anything else is rejected before execution.
        let statements = Parser::parse_sql(&DuckDbDialect {}, sql).map_err(|e| {
            Error::validation(e.to_string().trim_start_matches("sql parser error: ").to_string())
        })?;
        if statements.is_empty() || !statements.iter().all(|s| matches!(s, Statement::Query(_))) {
            return Err(Error::validation("only SELECT queries are allowed"));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut result_rows = stmt.query([])?;

        let mut rows: Vec<Vec<serde_json::Value>> = Vec::new();
        let mut column_count = 0;

        while let Some(row) = result_rows.next()? {
            if rows.is_empty() {
                column_count = row.as_ref().column_count();
            }
            let row_values = (0..column_count).map(|i| column_value(row, i)).collect();
            rows.push(row_values);
        }
        drop(result_rows);

        let count = if column_count > 0 { column_count } else { stmt.column_count() };
        let columns: Vec<String> = (0..count)
            .map(|i| {
                stmt.column_name(i)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| format!("col{}", i))
            })
            .collect();

        let row_count = rows.len();
        Ok(QueryResult { columns, rows, row_count })
    }
}

/// A transfer's unit of work, holding the connection for its lifetime
///
/// Holding the mutex guard serializes concurrent transfers at the
/// connection - the advisory-lock substitute for storage engines without
/// cross-table serializable transactions is not needed here, but the
/// serialization also guarantees the funds check cannot go stale.
pub struct DuckDbTransferUnit<'a> {
    conn: MutexGuard<'a, Connection>,
    open: bool,
}

impl TransferUnit for DuckDbTransferUnit<'_> {
    fn balance_of(&self, account_id: Uuid) -> Result<i64> {
        balance_on(&self.conn, account_id)
    }

    fn insert_transaction(&self, tx: &Transaction) -> Result<()> {
        self.conn.execute(
            "INSERT INTO transactions (transaction_id, from_account, to_account, amount,
                                       idempotency_key, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                tx.id.to_string(),
                tx.from_account.to_string(),
                tx.to_account.to_string(),
                tx.amount,
                tx.idempotency_key,
                tx.status.as_str(),
                timestamp_param(tx.created_at),
                timestamp_param(tx.updated_at),
            ],
        )?;
        Ok(())
    }

    fn append_entry(&self, entry: &LedgerEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO ledger_entries (entry_id, account_id, transaction_id, entry_type,
                                         amount, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                entry.id.to_string(),
                entry.account_id.to_string(),
                entry.transaction_id.to_string(),
                entry.entry_type.as_str(),
                entry.amount,
                timestamp_param(entry.created_at),
            ],
        )?;
        Ok(())
    }

    fn complete_transaction(&self, id: Uuid) -> Result<()> {
        self.conn.execute(
            "UPDATE transactions SET status = 'COMPLETED', updated_at = ? WHERE transaction_id = ?",
            params![timestamp_param(Utc::now()), id.to_string()],
        )?;
        Ok(())
    }

    fn commit(mut self: Box<Self>) -> Result<()> {
        self.open = false;
        match self.conn.execute_batch("COMMIT") {
            Ok(()) => Ok(()),
            Err(e) => {
                // A failed COMMIT leaves the transaction aborted; make sure
                // the connection is back in autocommit before release.
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e.into())
            }
        }
    }
}

impl Drop for DuckDbTransferUnit<'_> {
    fn drop(&mut self) {
        if self.open {
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

// === Parsing helpers ===

fn conversion_error(idx: usize, msg: String) -> duckdb::Error {
    duckdb::Error::FromSqlConversionFailure(
        idx,
        duckdb::types::Type::Text,
        msg.into(),
    )
}

fn parse_uuid(idx: usize, s: &str) -> duckdb::Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| {
        duckdb::Error::FromSqlConversionFailure(idx, duckdb::types::Type::Text, Box::new(e))
    })
}

/// Timestamps are written as naive UTC strings and read back via ::VARCHAR
fn timestamp_param(ts: DateTime<Utc>) -> String {
    ts.naive_utc().to_string()
}

fn parse_timestamp(idx: usize, s: &str) -> duckdb::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            duckdb::Error::FromSqlConversionFailure(idx, duckdb::types::Type::Text, Box::new(e))
        })
}

fn column_value(row: &duckdb::Row, idx: usize) -> serde_json::Value {
    use duckdb::types::ValueRef;

    match row.get_ref(idx) {
        Ok(ValueRef::Null) => serde_json::Value::Null,
        Ok(ValueRef::Boolean(b)) => serde_json::Value::Bool(b),
        Ok(ValueRef::TinyInt(i)) => serde_json::json!(i),
        Ok(ValueRef::SmallInt(i)) => serde_json::json!(i),
        Ok(ValueRef::Int(i)) => serde_json::json!(i),
        Ok(ValueRef::BigInt(i)) => serde_json::json!(i),
        Ok(ValueRef::HugeInt(i)) => serde_json::json!(i.to_string()),
        Ok(ValueRef::UTinyInt(i)) => serde_json::json!(i),
        Ok(ValueRef::USmallInt(i)) => serde_json::json!(i),
        Ok(ValueRef::UInt(i)) => serde_json::json!(i),
        Ok(ValueRef::UBigInt(i)) => serde_json::json!(i),
        Ok(ValueRef::Float(f)) => serde_json::json!(f),
        Ok(ValueRef::Double(f)) => serde_json::json!(f),
        Ok(ValueRef::Decimal(d)) => serde_json::Value::String(d.to_string()),
        Ok(ValueRef::Text(bytes)) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).to_string())
        }
        Ok(ValueRef::Blob(bytes)) => {
            serde_json::Value::String(format!("<blob {} bytes>", bytes.len()))
        }
        Ok(ValueRef::Date32(d)) => {
            let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            let date = epoch + chrono::Duration::days(d as i64);
            serde_json::Value::String(date.to_string())
        }
        Ok(ValueRef::Timestamp(_, ts)) => {
            let dt = chrono::DateTime::from_timestamp_micros(ts)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| ts.to_string());
            serde_json::Value::String(dt)
        }
        _ => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_repo(dir: &TempDir) -> DuckDbRepository {
        let repo = DuckDbRepository::new(&dir.path().join("test.duckdb")).unwrap();
        repo.ensure_schema().unwrap();
        repo
    }

    #[test]
    fn test_account_round_trip() {
        let dir = TempDir::new().unwrap();
        let repo = test_repo(&dir);

        let account = Account::new("alice", "USD");
        repo.add_account(&account).unwrap();

        let loaded = repo.account_by_id(account.id).unwrap().unwrap();
        assert_eq!(loaded.user_id, "alice");
        assert_eq!(loaded.kind, AccountKind::User);
        assert_eq!(loaded.status, AccountStatus::Active);
        assert_eq!(loaded.currency, "USD");

        assert!(repo.account_by_id(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_system_account_lookup() {
        let dir = TempDir::new().unwrap();
        let repo = test_repo(&dir);

        assert!(repo.system_account().unwrap().is_none());
        repo.add_account(&Account::system("USD")).unwrap();
        let system = repo.system_account().unwrap().unwrap();
        assert!(system.is_system());
    }

    #[test]
    fn test_balance_of_empty_account_is_zero() {
        let dir = TempDir::new().unwrap();
        let repo = test_repo(&dir);

        let account = Account::new("alice", "USD");
        repo.add_account(&account).unwrap();
        assert_eq!(repo.balance_of(account.id).unwrap(), 0);
    }

    #[test]
    fn test_unit_of_work_commit_persists() {
        let dir = TempDir::new().unwrap();
        let repo = test_repo(&dir);

        let from = Account::new("alice", "USD");
        let to = Account::new("bob", "USD");
        repo.add_account(&from).unwrap();
        repo.add_account(&to).unwrap();

        let tx = Transaction::new(from.id, to.id, 700, "uow-commit");
        {
            let unit = repo.begin_transfer().unwrap();
            unit.insert_transaction(&tx).unwrap();
            unit.append_entry(&LedgerEntry::credit(to.id, tx.id, 700)).unwrap();
            unit.append_entry(&LedgerEntry::debit(from.id, tx.id, 700)).unwrap();
            unit.complete_transaction(tx.id).unwrap();
            unit.commit().unwrap();
        }

        let loaded = repo.transaction_by_id(tx.id).unwrap().unwrap();
        assert_eq!(loaded.status, TransactionStatus::Completed);
        assert_eq!(repo.balance_of(to.id).unwrap(), 700);
        assert_eq!(repo.balance_of(from.id).unwrap(), -700);
        assert_eq!(repo.entries_by_transaction(tx.id).unwrap().len(), 2);
    }

    #[test]
    fn test_unit_of_work_rolls_back_on_drop() {
        let dir = TempDir::new().unwrap();
        let repo = test_repo(&dir);

        let from = Account::new("alice", "USD");
        let to = Account::new("bob", "USD");
        repo.add_account(&from).unwrap();
        repo.add_account(&to).unwrap();

        let tx = Transaction::new(from.id, to.id, 300, "uow-drop");
        {
            let unit = repo.begin_transfer().unwrap();
            unit.insert_transaction(&tx).unwrap();
            unit.append_entry(&LedgerEntry::credit(to.id, tx.id, 300)).unwrap();
            // dropped without commit
        }

        assert!(repo.transaction_by_id(tx.id).unwrap().is_none());
        assert_eq!(repo.entry_count().unwrap(), 0);
        assert_eq!(repo.balance_of(to.id).unwrap(), 0);
    }

    #[test]
    fn test_idempotency_key_unique_constraint() {
        let dir = TempDir::new().unwrap();
        let repo = test_repo(&dir);

        let from = Account::new("alice", "USD");
        let to = Account::new("bob", "USD");
        repo.add_account(&from).unwrap();
        repo.add_account(&to).unwrap();

        let first = Transaction::new(from.id, to.id, 100, "same-key");
        {
            let unit = repo.begin_transfer().unwrap();
            unit.insert_transaction(&first).unwrap();
            unit.commit().unwrap();
        }

        let second = Transaction::new(from.id, to.id, 100, "same-key");
        let unit = repo.begin_transfer().unwrap();
        let err = unit.insert_transaction(&second).unwrap_err();
        assert!(err.is_unique_violation(), "unexpected error: {err}");
    }

    #[test]
    fn test_execute_query_rejects_writes() {
        let dir = TempDir::new().unwrap();
        let repo = test_repo(&dir);

        assert!(repo.execute_query("SELECT COUNT(*) FROM accounts").is_ok());
        assert!(repo.execute_query("DELETE FROM ledger_entries").is_err());
        assert!(repo
            .execute_query("UPDATE ledger_entries SET amount = 0")
            .is_err());
        assert!(repo.execute_query("not even sql").is_err());
    }

    #[test]
    fn test_update_account_status() {
        let dir = TempDir::new().unwrap();
        let repo = test_repo(&dir);

        let account = Account::new("alice", "USD");
        repo.add_account(&account).unwrap();
        repo.update_account_status(account.id, AccountStatus::Frozen).unwrap();

        let loaded = repo.account_by_id(account.id).unwrap().unwrap();
        assert_eq!(loaded.status, AccountStatus::Frozen);

        assert!(repo
            .update_account_status(Uuid::new_v4(), AccountStatus::Closed)
            .is_err());
    }
}
