//! Tracing subscriber setup.
//!
//! Logs go to stderr, or to a file through a non-blocking writer when a log
//! file is configured. `RUST_LOG` overrides the configured filter.
//!
//! ```ignore
//! let _guard = markerlayer::logging::init(&LogConfig::default().with_filter("markerlayer=debug"))?;
//! ```
//!
//! Keep the returned guard alive for the life of the program; dropping it
//! flushes and stops the file writer.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor the caller sets one.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Errors setting up logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log filter '{directives}': {reason}")]
    InvalidFilter { directives: String, reason: String },

    #[error("Log file path has no file name: {}", .0.display())]
    InvalidLogFile(PathBuf),

    #[error("Failed to create log directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// `EnvFilter` directives, e.g. `info` or `markerlayer=debug`.
    pub filter: String,
    /// Write to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            file: None,
        }
    }
}

impl LogConfig {
    pub fn with_filter(mut self, directives: impl Into<String>) -> Self {
        self.filter = directives.into();
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }
}

/// Installs the global subscriber.
///
/// Returns the file writer's guard when logging to a file.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let file = config.file.as_deref().map(split_log_path).transpose()?;
    let filter = build_filter(std::env::var("RUST_LOG").ok(), &config.filter)?;

    match file {
        Some((dir, name)) => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()
                .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
            Ok(None)
        }
    }
}

fn build_filter(env: Option<String>, fallback: &str) -> Result<EnvFilter, LoggingError> {
    let directives = env
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    EnvFilter::try_new(&directives).map_err(|e| LoggingError::InvalidFilter {
        reason: e.to_string(),
        directives,
    })
}

fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LoggingError> {
    let name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidLogFile(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(name)))
}
