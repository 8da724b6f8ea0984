//! Capped single-file sitemap of the most recently registered companies.
//!
//! Unlike a full generation run this never touches the output directory or
//! the index files; it renders one `<urlset>` for the caller to place.

use crate::config::GeneratorConfig;
use crate::error::{Result, SitemapError};
use crate::model::{UrlRecord, MAX_URLS_PER_SEGMENT};
use crate::source::CompanySource;
use crate::xml;
use chrono::{DateTime, Utc};
use tracing::info;

/// A rendered preview document.
#[derive(Debug, Clone)]
pub struct Preview {
    pub records: Vec<UrlRecord>,
    pub body: Vec<u8>,
}

/// Render static pages followed by up to `limit` newest companies.
///
/// The document stays within one segment's capacity, so `limit` is clamped to
/// whatever room the static pages leave.
pub async fn render_preview(
    config: &GeneratorConfig,
    source: &mut dyn CompanySource,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<Preview> {
    let site = config.site()?;
    let room = MAX_URLS_PER_SEGMENT.saturating_sub(config.static_entries.len());
    if room == 0 {
        return Err(SitemapError::Config("static entries fill the whole preview".into()));
    }
    let limit = limit.min(room);

    let companies = source.fetch_recent(limit).await?;
    let mut records: Vec<UrlRecord> = config
        .static_entries
        .iter()
        .map(|e| e.to_record(&site))
        .collect();
    records.extend(
        companies
            .iter()
            .take(limit)
            .map(|row| UrlRecord::from_company(row, &site, now)),
    );

    let body = xml::render_urlset(&records)?;
    info!(urls = records.len(), companies = companies.len().min(limit), "rendered preview");
    Ok(Preview { records, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CompanyRow;
    use crate::source::testing::MemorySource;
    use chrono::TimeZone;

    fn dated(id: i64, year: i32) -> CompanyRow {
        CompanyRow {
            id,
            slug: None,
            registered_at: Some(Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()),
            status: None,
        }
    }

    #[tokio::test]
    async fn test_newest_first_after_static() {
        let config = GeneratorConfig::default();
        let mut source = MemorySource::new(vec![dated(1, 1999), dated(2, 2024), dated(3, 2010)]);

        let preview = render_preview(&config, &mut source, 2, Utc::now()).await.unwrap();
        let locs: Vec<&str> = preview.records.iter().map(|r| r.loc.as_str()).collect();
        assert_eq!(locs.len(), 9);
        assert_eq!(locs[0], "http://localhost:3000/");
        assert_eq!(locs[7], "http://localhost:3000/company/2");
        assert_eq!(locs[8], "http://localhost:3000/company/3");
    }

    #[tokio::test]
    async fn test_limit_clamped_to_capacity() {
        let config = GeneratorConfig::default();
        let mut source = MemorySource::with_rows(MAX_URLS_PER_SEGMENT + 10);

        let preview = render_preview(&config, &mut source, usize::MAX, Utc::now())
            .await
            .unwrap();
        assert_eq!(preview.records.len(), MAX_URLS_PER_SEGMENT);
        let parsed = xml::parse_locs(std::str::from_utf8(&preview.body).unwrap()).unwrap();
        assert_eq!(parsed.locs.len(), MAX_URLS_PER_SEGMENT);
    }
}
