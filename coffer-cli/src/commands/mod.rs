//! CLI command implementations

pub mod account;
pub mod audit;
pub mod fund;
pub mod init;
pub mod ledger;
pub mod logs;
pub mod query;
pub mod status;
pub mod transfer;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use coffer_core::services::{Event, LoggingService};
use coffer_core::CofferContext;

/// Get the coffer directory from environment or default
pub fn get_coffer_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("COFFER_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".coffer")
    }
}

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (logging never blocks
/// operations)
pub fn get_logger() -> Option<Arc<LoggingService>> {
    let coffer_dir = get_coffer_dir();
    std::fs::create_dir_all(&coffer_dir).ok()?;
    LoggingService::new(&coffer_dir, env!("CARGO_PKG_VERSION"))
        .ok()
        .map(Arc::new)
}

/// Log an event, ignoring any errors
pub fn log_event(logger: &Option<Arc<LoggingService>>, event: Event) {
    if let Some(l) = logger {
        let _ = l.record(event);
    }
}

/// Get or create coffer context
pub fn get_context(logger: Option<Arc<LoggingService>>) -> Result<CofferContext> {
    let coffer_dir = get_coffer_dir();

    std::fs::create_dir_all(&coffer_dir)
        .with_context(|| format!("Failed to create coffer directory: {:?}", coffer_dir))?;

    CofferContext::new(&coffer_dir, logger).context("Failed to initialize coffer context")
}
