//! Schema migrations for the ledger database
//!
//! Migrations are embedded SQL files applied in array order and recorded
//! in sys_migrations so each runs at most once. The first migration
//! creates the tracking table itself; when that table is absent the
//! database is treated as fresh and everything applies.

use std::collections::HashSet;

use duckdb::Connection;

use crate::domain::result::Result;
use crate::migrations::MIGRATIONS;

/// Outcome of a migration run
#[derive(Debug)]
pub struct MigrationResult {
    /// Names applied by this run, in order
    pub applied: Vec<String>,
    /// Count of migrations that were already recorded
    pub already_applied: usize,
}

pub struct MigrationService<'a> {
    conn: &'a Connection,
}

impl<'a> MigrationService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Apply every migration not yet recorded, in order
    pub fn run_pending(&self) -> Result<MigrationResult> {
        let recorded = self.recorded_set()?;

        let mut applied = Vec::new();
        for (name, sql) in MIGRATIONS {
            if recorded.contains(*name) {
                continue;
            }
            self.conn.execute_batch(sql)?;
            self.conn.execute(
                "INSERT INTO sys_migrations (migration_name) VALUES (?)",
                [*name],
            )?;
            applied.push((*name).to_string());
        }

        Ok(MigrationResult {
            applied,
            already_applied: recorded.len(),
        })
    }

    /// Names of migrations already recorded, in name order.
    /// The tracking table must exist.
    pub fn get_applied(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT migration_name FROM sys_migrations ORDER BY migration_name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut names = Vec::new();
        for name in rows {
            names.push(name?);
        }
        Ok(names)
    }

    /// Names of migrations a run would apply
    pub fn get_pending(&self) -> Result<Vec<String>> {
        let recorded = self.recorded_set()?;
        Ok(MIGRATIONS
            .iter()
            .filter(|(name, _)| !recorded.contains(*name))
            .map(|(name, _)| (*name).to_string())
            .collect())
    }

    fn recorded_set(&self) -> Result<HashSet<String>> {
        if !self.tracking_table_exists()? {
            return Ok(HashSet::new());
        }
        Ok(self.get_applied()?.into_iter().collect())
    }

    fn tracking_table_exists(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'sys_migrations'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
