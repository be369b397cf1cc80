//! Transfer service - moves funds between accounts
//!
//! Every movement is recorded as a transaction plus one CREDIT and one
//! DEBIT ledger entry of the same amount, written atomically in a single
//! unit of work. Submissions carry an idempotency key; resubmitting a key
//! replays the recorded outcome instead of moving funds twice.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, LedgerEntry, Transaction, TransactionStatus, TransferOutcome};
use crate::ports::{Notifier, Repository, TransferNotice};
use crate::services::{AccountService, Event, IdempotencyGuard, LoggingService};

pub struct TransferService {
    repository: Arc<dyn Repository>,
    accounts: Arc<AccountService>,
    guard: IdempotencyGuard,
    notifier: Arc<dyn Notifier>,
    events: Option<Arc<LoggingService>>,
    deliveries: Mutex<Vec<JoinHandle<()>>>,
}

impl TransferService {
    pub fn new(
        repository: Arc<dyn Repository>,
        accounts: Arc<AccountService>,
        notifier: Arc<dyn Notifier>,
        events: Option<Arc<LoggingService>>,
    ) -> Self {
        let guard = IdempotencyGuard::new(Arc::clone(&repository));
        Self {
            repository,
            accounts,
            guard,
            notifier,
            events,
            deliveries: Mutex::new(Vec::new()),
        }
    }

    /// Transfer funds between two accounts on behalf of `caller_user_id`.
    ///
    /// Validation runs in a fixed order: request shape, account
    /// resolution, ownership, account status, then the idempotency
    /// lookup. Only then is the unit of work opened, so a replayed key
    /// returns the recorded outcome without touching balances.
    pub fn transfer(
        &self,
        caller_user_id: &str,
        from: Uuid,
        to: Uuid,
        amount: i64,
        idempotency_key: &str,
    ) -> Result<TransferOutcome> {
        validate_request(from, to, amount, idempotency_key)?;

        let from_account = self.accounts.resolve(from)?;
        let to_account = self.accounts.resolve(to)?;
        self.accounts.require_ownership(&from_account, caller_user_id)?;
        self.accounts.require_active(&from_account)?;
        self.accounts.require_active(&to_account)?;

        if let Some(existing) = self.guard.lookup(idempotency_key)? {
            return Ok(TransferOutcome::replayed(existing));
        }

        let outcome = self.commit_transfer(&from_account, &to_account, amount, idempotency_key, true)?;

        if !outcome.already_processed {
            self.dispatch_notice(&outcome.transaction, &to_account.currency);
        }
        Ok(outcome)
    }

    /// Credit an account from the system funding account.
    ///
    /// The system account is exempt from the funds check; its balance
    /// goes negative as it issues funds, and the ledger stays conserved
    /// because that negative exactly offsets the credits issued. No
    /// notification is sent for funding.
    pub fn fund_initial(&self, to: Uuid, amount: i64, idempotency_key: &str) -> Result<TransferOutcome> {
        if amount <= 0 {
            return Err(Error::validation("amount must be positive"));
        }
        if idempotency_key.trim().is_empty() {
            return Err(Error::validation("idempotency key must not be empty"));
        }

        let to_account = self.accounts.resolve(to)?;
        self.accounts.require_active(&to_account)?;

        let system = self
            .repository
            .system_account()?
            .ok_or(Error::SystemAccountMissing)?;
        if to_account.id == system.id {
            return Err(Error::validation("cannot fund the system account"));
        }

        if let Some(existing) = self.guard.lookup(idempotency_key)? {
            return Ok(TransferOutcome::replayed(existing));
        }

        self.commit_transfer(&system, &to_account, amount, idempotency_key, false)
    }

    /// Open a unit of work, re-check funds against its snapshot, and
    /// write the transaction with its entry pair.
    ///
    /// A unique-constraint collision on the idempotency key means a
    /// concurrent racer committed first; the unit is already rolled back
    /// by then, and the racer's transaction is returned instead.
    fn commit_transfer(
        &self,
        from: &Account,
        to: &Account,
        amount: i64,
        idempotency_key: &str,
        check_funds: bool,
    ) -> Result<TransferOutcome> {
        let attempt = (|| -> Result<Transaction> {
            let unit = self.repository.begin_transfer()?;

            if check_funds {
                let balance = unit.balance_of(from.id)?;
                if balance < amount {
                    return Err(Error::InsufficientFunds {
                        balance,
                        requested: amount,
                    });
                }
            }

            let tx = Transaction::new(from.id, to.id, amount, idempotency_key);
            unit.insert_transaction(&tx)?;
            unit.append_entry(&LedgerEntry::credit(to.id, tx.id, amount))?;
            unit.append_entry(&LedgerEntry::debit(from.id, tx.id, amount))?;
            unit.complete_transaction(tx.id)?;
            unit.commit()?;
            Ok(tx)
        })();

        match attempt {
            Ok(mut tx) => {
                tx.status = TransactionStatus::Completed;
                Ok(TransferOutcome::fresh(tx))
            }
            Err(e) if e.is_unique_violation() => {
                // The unit of work is dropped and rolled back before this
                // lookup, so the connection is free again.
                match self.guard.lookup(idempotency_key)? {
                    Some(existing) => Ok(TransferOutcome::replayed(existing)),
                    None => Err(Error::CommitFailed(format!(
                        "idempotency key collision but no committed transaction found: {e}"
                    ))),
                }
            }
            Err(e @ (Error::InsufficientFunds { .. } | Error::Validation(_))) => Err(e),
            Err(Error::Database(msg)) => Err(Error::CommitFailed(msg)),
            Err(e) => Err(e),
        }
    }

    /// Deliver the transfer notice on a background thread.
    ///
    /// The transfer is already committed, so a failed delivery is
    /// recorded in the event log and otherwise ignored. The thread
    /// handle is retained so `flush_notifications` can wait for it;
    /// a short-lived process that exits right after the transfer would
    /// otherwise kill the delivery mid-flight.
    fn dispatch_notice(&self, tx: &Transaction, currency: &str) {
        let notice = TransferNotice {
            transaction_id: tx.id,
            from_account: tx.from_account,
            to_account: tx.to_account,
            amount: tx.amount,
            currency: currency.to_string(),
        };
        let notifier = Arc::clone(&self.notifier);
        let events = self.events.clone();

        let handle = thread::spawn(move || {
            if let Err(e) = notifier.transfer_completed(&notice) {
                if let Some(log) = events {
                    let _ = log.record(
                        Event::new("notification_failed")
                            .with_error_kind(e.kind())
                            .with_error(e.to_string()),
                    );
                }
            } else if let Some(log) = events {
                let _ = log.record_event("notification_sent");
            }
        });
        if let Ok(mut pending) = self.deliveries.lock() {
            pending.push(handle);
        }
    }

    /// Wait for in-flight notice deliveries to finish.
    ///
    /// Call this before exiting a short-lived process. The transfer
    /// result is already returned by then; this only holds the process
    /// open until delivery threads run to completion. Delivery itself is
    /// bounded by the notifier's own request timeout.
    pub fn flush_notifications(&self) {
        let handles: Vec<JoinHandle<()>> = match self.deliveries.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => return,
        };
        for handle in handles {
            let _ = handle.join();
        }
    }
}

fn validate_request(from: Uuid, to: Uuid, amount: i64, idempotency_key: &str) -> Result<()> {
    if amount <= 0 {
        return Err(Error::validation("amount must be positive"));
    }
    if idempotency_key.trim().is_empty() {
        return Err(Error::validation("idempotency key must not be empty"));
    }
    if from == to {
        return Err(Error::validation("cannot transfer to the same account"));
    }
    Ok(())
}
