//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors loading or interpreting a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or parsed.
    #[error("Failed to load config file {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// The INI text is malformed.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ini::ParseError),

    /// A key holds a value of the wrong type or out of range.
    #[error("Invalid value '{value}' for [{section}] {key}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
    },
}
