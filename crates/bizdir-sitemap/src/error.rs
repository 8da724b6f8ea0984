//! Error types for sitemap generation.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for sitemap operations.
pub type Result<T> = std::result::Result<T, SitemapError>;

/// Errors that abort a generation run.
///
/// None of these are retried; every variant propagates to the caller.
#[derive(Debug, Error)]
pub enum SitemapError {
    /// A directory or file could not be created, deleted, read or written.
    #[error("I/O failure at {}: {source}", .path.display())]
    Io {
        /// Path the operation was acting on.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },

    /// The row source failed or returned malformed data.
    #[error("data source failure: {0}")]
    DataSource(String),

    /// A document could not be serialized or parsed.
    #[error("xml error: {0}")]
    Xml(String),

    /// Generator settings are unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SitemapError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build an XML error from any displayable cause.
    pub fn xml(cause: impl std::fmt::Display) -> Self {
        Self::Xml(cause.to_string())
    }

    /// True for filesystem failures.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// True for data source failures.
    pub fn is_data_source(&self) -> bool {
        matches!(self, Self::DataSource(_))
    }
}

impl From<rusqlite::Error> for SitemapError {
    fn from(e: rusqlite::Error) -> Self {
        Self::DataSource(e.to_string())
    }
}
