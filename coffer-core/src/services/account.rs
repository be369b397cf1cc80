//! Account service - account lifecycle and access checks
//!
//! Wraps the repository's account operations with the validation every
//! money-movement path relies on: resolution, active-status checks and
//! ownership checks.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, AccountStatus};
use crate::ports::Repository;

pub struct AccountService {
    repository: Arc<dyn Repository>,
}

impl AccountService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Open a new user account
    pub fn open_account(&self, user_id: &str, currency: &str) -> Result<Account> {
        let account = Account::new(user_id, currency);
        account.validate().map_err(Error::validation)?;
        self.repository.add_account(&account)?;
        Ok(account)
    }

    /// Ensure the system funding account exists, creating it if missing
    pub fn ensure_system_account(&self, currency: &str) -> Result<Account> {
        if let Some(existing) = self.repository.system_account()? {
            return Ok(existing);
        }
        let account = Account::system(currency);
        account.validate().map_err(Error::validation)?;
        self.repository.add_account(&account)?;
        Ok(account)
    }

    /// Resolve an account id, failing with InvalidAccount when unknown
    pub fn resolve(&self, id: Uuid) -> Result<Account> {
        self.repository
            .account_by_id(id)?
            .ok_or_else(|| Error::invalid_account(id.to_string()))
    }

    /// Reject frozen and closed accounts
    pub fn require_active(&self, account: &Account) -> Result<()> {
        if !account.is_active() {
            return Err(Error::AccountInactive(format!(
                "{} is {}",
                account.id,
                account.status.as_str()
            )));
        }
        Ok(())
    }

    /// The caller may only move funds out of their own accounts
    pub fn require_ownership(&self, account: &Account, caller_user_id: &str) -> Result<()> {
        if account.user_id != caller_user_id {
            return Err(Error::Forbidden(format!(
                "caller {caller_user_id:?} does not own account {}",
                account.id
            )));
        }
        Ok(())
    }

    /// Ownership-checked balance read
    pub fn balance_for_owner(&self, id: Uuid, caller_user_id: &str) -> Result<i64> {
        let account = self.resolve(id)?;
        self.require_ownership(&account, caller_user_id)?;
        self.repository.balance_of(id)
    }

    pub fn accounts(&self) -> Result<Vec<Account>> {
        self.repository.accounts()
    }

    pub fn accounts_for_user(&self, user_id: &str) -> Result<Vec<Account>> {
        self.repository.accounts_for_user(user_id)
    }

    /// Change an account's status
    ///
    /// The system account's status is fixed; freezing or closing it would
    /// strand the funding path.
    pub fn set_status(&self, id: Uuid, status: AccountStatus) -> Result<Account> {
        let account = self.resolve(id)?;
        if account.is_system() {
            return Err(Error::validation("the system account's status cannot be changed"));
        }
        self.repository.update_account_status(id, status)?;
        self.resolve(id)
    }
}
