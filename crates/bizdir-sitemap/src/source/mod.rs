//! Row sources feeding the exporter.
//!
//! The generator never owns a global client: callers open a source, lend it to
//! the pipeline for one run, and close it afterwards.

pub mod sqlite;

use crate::error::Result;
use crate::model::CompanyRow;
use async_trait::async_trait;

pub use sqlite::{SqliteSource, TableSpec};

/// Read-only, offset-paginated access to the companies table.
#[async_trait]
pub trait CompanySource: Send {
    /// Total number of rows. Used for progress reporting only.
    async fn count(&mut self) -> Result<u64>;

    /// Up to `limit` rows starting at `offset`, ordered by id ascending.
    ///
    /// An empty page signals the end of the table.
    async fn fetch_page(&mut self, offset: u64, limit: usize) -> Result<Vec<CompanyRow>>;

    /// The `limit` most recently registered companies, newest first.
    async fn fetch_recent(&mut self, limit: usize) -> Result<Vec<CompanyRow>>;
}
