//! Error types for sqlsentry core.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type.
///
/// Only construction can fail. Analysis of a payload is total.
#[derive(Debug, Error)]
pub enum SentryError {
    /// Configuration is invalid or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A configured file could not be read.
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Signature catalog passthrough.
    #[error("Signature catalog error: {0}")]
    Catalog(#[from] sqlsentry_firewall::CatalogError),
}
