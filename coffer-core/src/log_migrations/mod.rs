//! Event log migrations - embedded SQL for logs.duckdb
//!
//! The event log lives in its own database file so operational telemetry
//! never shares a write path with the ledger.

/// All event-log migrations, embedded at compile time.
/// Format: (filename, sql_content)
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_event_log.sql", include_str!("001_event_log.sql")),
];
