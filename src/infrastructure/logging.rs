//! Logging system configuration and initialization
//!
//! This module provides the logging setup with:
//! - Config-file based log level control (RUST_LOG still wins)
//! - Structured JSON logging (optional)
//! - Console output and daily-rolling file output
//! - Log files stored next to the executable unless configured otherwise

#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use chrono::Local;
use lazy_static::lazy_static;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "release-harvest.log";

// Keeps the non-blocking file writer alive for the life of the process
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<WorkerGuard>> = Mutex::new(Vec::new());
}

/// Local wall-clock timestamps with milliseconds
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Get the log directory relative to the executable location
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(std::path::Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

/// Build the filter for the configured level.
///
/// `RUST_LOG` overrides everything. Otherwise dependency noise is capped by
/// `module_filters` unless the level is `trace`.
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    if !config.level.to_lowercase().contains("trace") {
        for (module, level) in &config.module_filters {
            let directive = format!("{}={}", module, level)
                .parse()
                .map_err(|e| anyhow!("Invalid module filter {}={}: {}", module, level, e))?;
            filter = filter.add_directive(directive);
        }
    }

    Ok(filter)
}

/// Initialize logging with custom configuration
///
/// ```bash
/// # Show request-level HTTP logs
/// RUST_LOG="debug,reqwest=debug,hyper=debug" release-harvest
/// ```
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(config)?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    if config.console_output {
        let console = fmt::layer().with_target(false).with_timer(LocalTimeFormatter);
        if config.json_format {
            layers.push(console.json().boxed());
        } else {
            layers.push(console.boxed());
        }
    }

    if config.file_output {
        let log_dir = config.log_dir.clone().unwrap_or_else(get_log_directory);
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

        let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        LOG_GUARDS
            .lock()
            .map_err(|_| anyhow!("Log guard registry poisoned"))?
            .push(guard);

        let file = fmt::layer()
            .with_ansi(false)
            .with_timer(LocalTimeFormatter)
            .with_writer(writer);
        if config.json_format {
            layers.push(file.json().boxed());
        } else {
            layers.push(file.boxed());
        }
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!("Logging initialized at level {}", config.level);
    Ok(())
}
