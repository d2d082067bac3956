//! Configuration infrastructure
//!
//! Contains configuration loading and management for release-notes harvesting.
//!
//! Configuration is a single JSON file split into sections:
//! 1. `source` - where to start and which selectors to use
//! 2. `timing` - bounded waits for page markup
//! 3. `http` - request behaviour of the page fetcher
//! 4. `storage` - where the ledger and dataset live
//! 5. `logging` - log level and outputs
//!
//! Every field falls back to its default when missing from the file.

#![allow(clippy::derivable_impls)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::infrastructure::parsing::SelectorConfig;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub timing: TimingConfig,
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Where harvesting starts and how pages are read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Landing page listing every product
    pub landing_url: String,

    /// CSS selectors for the three page kinds
    pub selectors: SelectorConfig,
}

/// Bounded waits for markup to appear
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Wait for the product listing on the landing page
    pub discovery_timeout_ms: u64,

    /// Wait for release table rows on a product's index page
    pub release_table_timeout_ms: u64,

    /// Interval between document reloads while waiting
    pub poll_interval_ms: u64,
}

impl TimingConfig {
    pub const fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    pub const fn release_table_timeout(&self) -> Duration {
        Duration::from_millis(self.release_table_timeout_ms)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// HTTP page fetcher settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,

    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,

    pub max_requests_per_second: u32,

    pub follow_redirects: bool,
}

/// Location of the persisted ledger and dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,

    /// Scraped changelog URLs (JSON array of strings)
    pub ledger_file: String,

    /// Accumulated release records (JSON array of objects)
    pub dataset_file: String,
}

impl StorageConfig {
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(&self.ledger_file)
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join(&self.dataset_file)
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for log files; defaults to `logs/` next to the executable
    pub log_dir: Option<PathBuf>,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            landing_url: release_notes::LANDING_URL.to_string(),
            selectors: SelectorConfig::default(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            discovery_timeout_ms: defaults::DISCOVERY_TIMEOUT_MS,
            release_table_timeout_ms: defaults::RELEASE_TABLE_TIMEOUT_MS,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            follow_redirects: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(defaults::DATA_DIR),
            ledger_file: defaults::LEDGER_FILE.to_string(),
            dataset_file: defaults::DATASET_FILE.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Manager for the per-user default config file
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE);
        Ok(Self { config_path })
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load configuration from file, creating default if it doesn't exist.
    ///
    /// A file that exists but does not parse is an error; it is never
    /// overwritten with defaults.
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("Failed to read configuration file {:?}", self.config_path))?;

        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration file {:?}", self.config_path))?;

        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// BuddyBoss release-notes site URLs and markup
pub mod release_notes {
    /// Landing page listing every product
    pub const LANDING_URL: &str = "https://www.buddyboss.com/resources/release-notes/";

    /// One product card on the landing page
    pub const PRODUCT_ITEM: &str = ".release-dir-items-wrap.model";

    pub const PRODUCT_TITLE: &str = "h3.model-title";

    /// "View all releases" link inside a card
    pub const PRODUCT_LINK: &str = ".release-dir-item-link a";

    pub const RELEASE_ROW: &str = ".bb-cli-table tbody tr";

    pub const CHANGELOG_LINK_TEXT: &str = "Changelog";

    pub const CHANGELOG_TITLE: &str = ".entry-title";

    pub const CHANGELOG_REGION: &str = ".entry-reference";
}

/// Default configuration values
pub mod defaults {
    pub const APP_DIR_NAME: &str = "release-harvest";

    pub const CONFIG_FILE: &str = "release_harvest_config.json";

    /// The landing listing is either there quickly or not at all
    pub const DISCOVERY_TIMEOUT_MS: u64 = 1_000;

    pub const RELEASE_TABLE_TIMEOUT_MS: u64 = 10_000;

    pub const POLL_INTERVAL_MS: u64 = 250;

    pub const USER_AGENT: &str = "release-harvest/0.1 (+release notes archiver)";

    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    pub const MAX_REQUESTS_PER_SECOND: u32 = 5;

    pub const DATA_DIR: &str = ".";

    pub const LEDGER_FILE: &str = "scraped-urls.json";

    pub const DATASET_FILE: &str = "all-releases.json";

    pub const LOG_LEVEL: &str = "info";

    pub const LOG_JSON_FORMAT: bool = false;

    pub const LOG_CONSOLE_OUTPUT: bool = true;

    pub const LOG_FILE_OUTPUT: bool = false;
}
