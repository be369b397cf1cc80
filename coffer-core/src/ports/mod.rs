//! Port definitions - traits for external dependencies
//!
//! Services depend on these traits; adapters provide the implementations.

pub mod notifier;
pub mod repository;

pub use notifier::{Notifier, NullNotifier, TransferNotice};
pub use repository::{QueryResult, Repository, TransferUnit};
