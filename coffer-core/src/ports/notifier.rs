//! Notifier port - outbound completion events
//!
//! Delivery is fire-and-forget: the transfer has already committed by the
//! time a notice is built, and nothing a notifier does can roll it back.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::result::Result;

/// Payload describing a committed transfer
#[derive(Debug, Clone, Serialize)]
pub struct TransferNotice {
    pub transaction_id: Uuid,
    pub from_account: Uuid,
    pub to_account: Uuid,
    /// Minor currency units
    pub amount: i64,
    pub currency: String,
}

/// Receives completion events after a transfer commits
pub trait Notifier: Send + Sync {
    fn transfer_completed(&self, notice: &TransferNotice) -> Result<()>;
}

/// No-op notifier used when no delivery endpoint is configured
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn transfer_completed(&self, _notice: &TransferNotice) -> Result<()> {
        Ok(())
    }
}
