//! Webhook notifier - POSTs transfer notices to a configured URL
//!
//! Delivery is best effort. The transfer service dispatches notices on a
//! background thread and logs failures; a dead webhook endpoint never
//! affects a committed transfer.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::domain::result::{Error, Result};
use crate::ports::{Notifier, TransferNotice};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Notifier that delivers transfer notices as JSON over HTTP
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::database(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Notifier for WebhookNotifier {
    fn transfer_completed(&self, notice: &TransferNotice) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(notice)
            .send()
            .map_err(|e| Error::database(format!("webhook delivery failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::database(format!(
                "webhook returned status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
