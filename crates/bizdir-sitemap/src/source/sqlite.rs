//! SQLite-backed company source.

use crate::error::{Result, SitemapError};
use crate::model::CompanyRow;
use crate::source::CompanySource;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::debug;

/// Table and column names of the companies table.
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub table: String,
    pub id: String,
    pub slug: String,
    pub registered_at: String,
    pub status: String,
}

impl Default for TableSpec {
    fn default() -> Self {
        Self {
            table: "companies_data".to_string(),
            id: "id".to_string(),
            slug: "url_title".to_string(),
            registered_at: "company_reg_date".to_string(),
            status: "company_status".to_string(),
        }
    }
}

impl TableSpec {
    /// Identifiers are interpolated into SQL, so only `[A-Za-z0-9_]` is allowed.
    pub fn validate(&self) -> Result<()> {
        for name in [
            &self.table,
            &self.id,
            &self.slug,
            &self.registered_at,
            &self.status,
        ] {
            let ok = !name.is_empty()
                && !name.starts_with(|c: char| c.is_ascii_digit())
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !ok {
                return Err(SitemapError::Config(format!("invalid SQL identifier: '{name}'")));
            }
        }
        Ok(())
    }

    fn select_columns(&self) -> String {
        format!(
            "SELECT {}, {}, {}, {} FROM {}",
            self.id, self.slug, self.registered_at, self.status, self.table
        )
    }
}

/// Read-only handle on a SQLite database holding the companies table.
///
/// Queries run on the calling task; the generator is sequential, so there is
/// nothing else to schedule while a page is being read.
pub struct SqliteSource {
    db: Connection,
    spec: TableSpec,
}

impl SqliteSource {
    /// Open an existing database read-only.
    pub fn open(path: &Path, spec: TableSpec) -> Result<Self> {
        spec.validate()?;
        let db = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            SitemapError::DataSource(format!("failed to open {}: {e}", path.display()))
        })?;
        Ok(Self::from_connection(db, spec))
    }

    /// Wrap an already open connection.
    pub fn from_connection(db: Connection, spec: TableSpec) -> Self {
        Self { db, spec }
    }

    /// Release the connection, surfacing any error from closing it.
    pub fn close(self) -> Result<()> {
        self.db.close().map_err(|(_, e)| e.into())
    }

    fn query_rows(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<CompanyRow>> {
        let mut stmt = self.db.prepare_cached(sql)?;
        let raw = stmt
            .query_map(params, |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Value>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(id, slug, registered, status)| {
                Ok(CompanyRow {
                    id,
                    slug,
                    registered_at: parse_registered(id, registered)?,
                    status,
                })
            })
            .collect()
    }
}

#[async_trait]
impl CompanySource for SqliteSource {
    async fn count(&mut self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.spec.table);
        let n: i64 = self.db.query_row(&sql, [], |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    async fn fetch_page(&mut self, offset: u64, limit: usize) -> Result<Vec<CompanyRow>> {
        let sql = format!(
            "{} ORDER BY {} ASC LIMIT ?1 OFFSET ?2",
            self.spec.select_columns(),
            self.spec.id
        );
        debug!(offset, limit, "fetching company page");
        self.query_rows(&sql, rusqlite::params![sql_int(limit as u64)?, sql_int(offset)?])
    }

    async fn fetch_recent(&mut self, limit: usize) -> Result<Vec<CompanyRow>> {
        let sql = format!(
            "{} ORDER BY {} DESC NULLS LAST, {} DESC LIMIT ?1",
            self.spec.select_columns(),
            self.spec.registered_at,
            self.spec.id
        );
        self.query_rows(&sql, rusqlite::params![sql_int(limit as u64)?])
    }
}

/// SQLite integers are signed; larger values would read as "no limit".
fn sql_int(n: u64) -> Result<i64> {
    i64::try_from(n)
        .map_err(|_| SitemapError::DataSource(format!("{n} is out of range for a SQLite query")))
}

/// Registration dates are stored either as text or as epoch milliseconds.
fn parse_registered(id: i64, value: Value) -> Result<Option<DateTime<Utc>>> {
    match value {
        Value::Null => Ok(None),
        Value::Integer(ms) => DateTime::from_timestamp_millis(ms)
            .map(Some)
            .ok_or_else(|| malformed(id, &ms.to_string())),
        Value::Text(text) => parse_date_text(&text)
            .map(Some)
            .ok_or_else(|| malformed(id, &text)),
        Value::Real(r) => Err(malformed(id, &r.to_string())),
        Value::Blob(_) => Err(malformed(id, "<blob>")),
    }
}

fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn malformed(id: i64, raw: &str) -> SitemapError {
    SitemapError::DataSource(format!("company {id}: unparseable registration date '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixture(rows: &[(i64, Option<&str>, Option<&str>, Option<&str>)]) -> SqliteSource {
        let db = Connection::open_in_memory().unwrap();
        db.execute_batch(
            "CREATE TABLE companies_data (
                id INTEGER PRIMARY KEY,
                url_title TEXT,
                company_reg_date TEXT,
                company_status TEXT
            );",
        )
        .unwrap();
        for (id, slug, date, status) in rows {
            db.execute(
                "INSERT INTO companies_data (id, url_title, company_reg_date, company_status)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, slug, date, status],
            )
            .unwrap();
        }
        SqliteSource::from_connection(db, TableSpec::default())
    }

    #[tokio::test]
    async fn test_pages_ordered_by_id() {
        let mut src = fixture(&[
            (3, Some("c"), None, None),
            (1, Some("a"), None, Some("Active")),
            (2, None, None, None),
        ]);
        assert_eq!(src.count().await.unwrap(), 3);

        let first = src.fetch_page(0, 2).await.unwrap();
        assert_eq!(first.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(first[0].slug.as_deref(), Some("a"));
        assert!(first[0].is_active());
        assert!(first[1].slug.is_none());

        let second = src.fetch_page(2, 2).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, 3);

        assert!(src.fetch_page(4, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_date_formats() {
        let mut src = fixture(&[
            (1, None, Some("2019-04-01"), None),
            (2, None, Some("2019-04-01 12:30:00"), None),
            (3, None, Some("2019-04-01T12:30:00.000Z"), None),
        ]);
        let rows = src.fetch_page(0, 10).await.unwrap();
        assert_eq!(
            rows[0].registered_at,
            Some(Utc.with_ymd_and_hms(2019, 4, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            rows[1].registered_at,
            Some(Utc.with_ymd_and_hms(2019, 4, 1, 12, 30, 0).unwrap())
        );
        assert_eq!(rows[1].registered_at, rows[2].registered_at);
    }

    #[tokio::test]
    async fn test_out_of_range_page_bounds_are_rejected() {
        let mut src = fixture(&[(1, None, None, None), (2, None, None, None)]);
        assert!(src.fetch_page(0, usize::MAX).await.unwrap_err().is_data_source());
        assert!(src.fetch_page(u64::MAX, 10).await.unwrap_err().is_data_source());
        assert!(src.fetch_recent(usize::MAX).await.unwrap_err().is_data_source());
        assert_eq!(src.fetch_page(0, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_date_is_data_source_failure() {
        let mut src = fixture(&[(1, None, Some("last tuesday"), None)]);
        let err = src.fetch_page(0, 10).await.unwrap_err();
        assert!(err.is_data_source());
    }

    #[tokio::test]
    async fn test_recent_newest_first() {
        let mut src = fixture(&[
            (1, None, Some("2001-01-01"), None),
            (2, None, None, None),
            (3, None, Some("2020-01-01"), None),
        ]);
        let rows = src.fetch_recent(2).await.unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 1]);
    }

    #[tokio::test]
    async fn test_missing_table_is_data_source_failure() {
        let db = Connection::open_in_memory().unwrap();
        let mut src = SqliteSource::from_connection(db, TableSpec::default());
        assert!(src.count().await.unwrap_err().is_data_source());
    }

    #[test]
    fn test_open_file_and_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("companies.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TABLE companies_data (
                    id INTEGER PRIMARY KEY,
                    url_title TEXT,
                    company_reg_date TEXT,
                    company_status TEXT
                );",
            )
            .unwrap();

        let src = SqliteSource::open(&path, TableSpec::default()).unwrap();
        src.close().unwrap();
    }

    #[test]
    fn test_rejects_unsafe_identifiers() {
        let spec = TableSpec {
            table: "companies; DROP TABLE x".into(),
            ..TableSpec::default()
        };
        assert!(spec.validate().is_err());
        assert!(TableSpec::default().validate().is_ok());
    }
}
