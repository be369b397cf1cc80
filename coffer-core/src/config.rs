//! Configuration management
//!
//! settings.json in the coffer directory:
//! ```json
//! {
//!   "app": { "defaultCurrency": "USD", "webhookUrl": "https://..." }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    default_currency: Option<String>,
    #[serde(default)]
    webhook_url: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Coffer configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    /// Currency for new accounts when none is given
    pub default_currency: String,
    /// Where transfer notices are delivered; None disables delivery
    pub webhook_url: Option<String>,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

pub const DEFAULT_CURRENCY: &str = "USD";

impl Default for Config {
    fn default() -> Self {
        Self {
            default_currency: DEFAULT_CURRENCY.to_string(),
            webhook_url: None,
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the coffer directory
    ///
    /// The webhook URL can come from:
    /// 1. Settings file
    /// 2. Environment variable COFFER_WEBHOOK_URL (takes precedence)
    pub fn load(coffer_dir: &Path) -> Result<Self> {
        let settings_path = coffer_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let webhook_url = std::env::var("COFFER_WEBHOOK_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| raw.app.webhook_url.clone());

        let default_currency = raw
            .app
            .default_currency
            .clone()
            .filter(|c| !c.trim().is_empty())
            .map(|c| c.trim().to_uppercase())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        Ok(Self {
            default_currency,
            webhook_url,
            _raw_settings: raw,
        })
    }

    /// Save config to the coffer directory, preserving settings this
    /// view does not manage
    pub fn save(&self, coffer_dir: &Path) -> Result<()> {
        let settings_path = coffer_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.app.default_currency = Some(self.default_currency.clone());
        settings.app.webhook_url = self.webhook_url.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}
