//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;

use markerlayer::config::ConfigError;
use markerlayer::geo::GeoError;
use markerlayer::logging::LoggingError;
use markerlayer::layer::LayerError;
use markerlayer::poi::PoiError;

/// Errors surfaced to the user by the `markerlayer` binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Logging(#[from] LoggingError),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid marker file {}: {source}", path.display())]
    MarkerFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid coordinate: {0}")]
    Coordinate(#[from] GeoError),

    #[error("Failed to create Tokio runtime: {0}")]
    Runtime(std::io::Error),

    #[error("{0}")]
    Store(#[from] PoiError),

    #[error("{0}")]
    Layer(#[from] LayerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_names_path() {
        let err = CliError::Read {
            path: PathBuf::from("markers.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let text = err.to_string();
        assert!(text.contains("markers.json"));
        assert!(text.contains("missing"));
    }

    #[test]
    fn test_coordinate_error_converts() {
        let err: CliError = GeoError::InvalidLatitude(91.0).into();
        assert!(err.to_string().starts_with("Invalid coordinate"));
    }

    #[test]
    fn test_store_error_converts() {
        let err: CliError = PoiError::InvalidThreshold(-1.0).into();
        assert!(err.to_string().starts_with("Invalid proximity threshold"));
    }
}
