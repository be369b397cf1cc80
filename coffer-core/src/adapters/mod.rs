//! Adapters - concrete implementations of the ports

pub mod duckdb;
pub mod webhook;

pub use self::duckdb::DuckDbRepository;
pub use webhook::WebhookNotifier;
