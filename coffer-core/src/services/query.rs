//! Query service - read-only SQL access to the ledger database
//!
//! The repository rejects anything that is not a pure SELECT, so this
//! surface cannot be used to rewrite history.

use std::sync::Arc;

use crate::domain::result::Result;
use crate::ports::{QueryResult, Repository};

pub struct QueryService {
    repository: Arc<dyn Repository>,
}

impl QueryService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.repository.execute_query(sql)
    }
}
