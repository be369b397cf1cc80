//! Database migrations - embedded SQL files
//!
//! Migrations are compiled into the binary at build time using include_str!.
//! Each migration is a tuple of (name, sql_content), applied in name order
//! and tracked in the sys_migrations table.
//!
//! When adding a new migration:
//! 1. Create the SQL file: NNN_description.sql
//! 2. Add an entry here in order

/// All migrations, embedded at compile time.
/// Format: (filename, sql_content)
pub const MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
