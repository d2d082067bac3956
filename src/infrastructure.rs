//! Infrastructure layer for configuration, logging, page fetching, HTML
//! parsing and persisted state

pub mod config; // Configuration file and defaults
pub mod http_page_fetcher;
pub mod logging; // Logging infrastructure
pub mod page_fetcher;
pub mod parsing;
pub mod parsing_error;
pub mod state_store;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager, release_notes};
pub use http_page_fetcher::HttpPageFetcher;
pub use logging::{get_log_directory, init_logging_with_config};
pub use page_fetcher::{BrowserPage, FetchError, FetchResult, PageFetcher};
pub use parsing::{ChangelogParser, PageParser, ParsingError, ParsingResult, ProductListParser, ReleaseTableParser};
pub use state_store::{JsonStateStore, PersistedState, StateStore, StoreError};
