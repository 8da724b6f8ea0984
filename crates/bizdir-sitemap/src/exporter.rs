//! Segmented exporter: scans the companies table page by page and seals
//! fixed-capacity sitemap segments as they fill.
//!
//! `page_size` bounds how many rows are held from the source at once;
//! `capacity` bounds how many URLs land in one file. A segment is written
//! the moment it reaches capacity and is never touched again, so every
//! numbered segment but the last is exactly full.

use crate::config::GeneratorConfig;
use crate::error::{Result, SitemapError};
use crate::model::{company_segment_name, SiteUrl, StaticEntry, UrlRecord, STATIC_SEGMENT};
use crate::source::CompanySource;
use crate::xml;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Observer for scan progress. All methods default to no-ops.
pub trait ExportProgress: Send + Sync {
    /// The scan is starting; `total_rows` is the source's row count.
    fn started(&self, _total_rows: u64) {}

    /// A page was consumed.
    fn page_done(&self, _processed: u64, _total_rows: u64, _elapsed: Duration) {}

    /// A segment file was written.
    fn segment_sealed(&self, _filename: &str, _urls: usize) {}

    /// The source is exhausted and every segment is on disk.
    fn finished(&self, _processed: u64) {}
}

/// Progress observer that reports nothing.
pub struct NoProgress;

impl ExportProgress for NoProgress {}

/// A segment file that has been written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SealedSegment {
    pub filename: String,
    pub urls: usize,
}

/// Outcome of a full scan.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    /// Numbered company segments in index order.
    pub segments: Vec<SealedSegment>,
    /// Row count reported by the source before the scan.
    pub total_rows: u64,
    /// Rows actually observed during the scan.
    pub rows_exported: u64,
}

/// Records waiting to be sealed into the next numbered segment.
struct PendingSegment {
    records: Vec<UrlRecord>,
    capacity: usize,
    next_index: usize,
}

impl PendingSegment {
    fn new(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            capacity,
            next_index: 1,
        }
    }

    fn push(&mut self, record: UrlRecord) {
        self.records.push(record);
    }

    fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Hand out the buffered records with their segment index and reset.
    fn take(&mut self) -> (usize, Vec<UrlRecord>) {
        let index = self.next_index;
        self.next_index += 1;
        let records = std::mem::replace(&mut self.records, Vec::with_capacity(self.capacity));
        (index, records)
    }
}

/// Writes segment files for one generation run.
pub struct SegmentedExporter<'a> {
    output_dir: &'a Path,
    site: &'a SiteUrl,
    page_size: usize,
    capacity: usize,
    now: DateTime<Utc>,
    progress: &'a dyn ExportProgress,
}

impl<'a> SegmentedExporter<'a> {
    /// `now` is the run clock, used as `<lastmod>` for rows without a date.
    pub fn new(config: &'a GeneratorConfig, site: &'a SiteUrl, now: DateTime<Utc>) -> Self {
        Self {
            output_dir: &config.output_dir,
            site,
            page_size: config.page_size,
            capacity: config.segment_capacity,
            now,
            progress: &NoProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ExportProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Write the static pages as `segment-static.xml`.
    pub async fn write_static(&self, entries: &[StaticEntry]) -> Result<SealedSegment> {
        let records: Vec<UrlRecord> = entries.iter().map(|e| e.to_record(self.site)).collect();
        self.write_segment(STATIC_SEGMENT, &records).await?;
        info!(file = STATIC_SEGMENT, urls = records.len(), "wrote static segment");
        Ok(SealedSegment {
            filename: STATIC_SEGMENT.to_string(),
            urls: records.len(),
        })
    }

    /// Scan the whole source and seal numbered segments.
    ///
    /// A failed page fetch or segment write aborts the scan. Segments sealed
    /// before the failure stay on disk.
    pub async fn export(&self, source: &mut dyn CompanySource) -> Result<ExportSummary> {
        let total_rows = source.count().await?;
        info!(total_rows, page_size = self.page_size, capacity = self.capacity, "starting export");
        self.progress.started(total_rows);

        let mut pending = PendingSegment::new(self.capacity);
        let mut segments = Vec::new();
        let mut offset: u64 = 0;
        let mut processed: u64 = 0;

        loop {
            let started = Instant::now();
            let page = source.fetch_page(offset, self.page_size).await?;
            if page.is_empty() {
                break;
            }

            for row in &page {
                pending.push(UrlRecord::from_company(row, self.site, self.now));
                if pending.is_full() {
                    segments.push(self.seal(&mut pending).await?);
                }
            }

            processed += page.len() as u64;
            offset = offset.checked_add(self.page_size as u64).ok_or_else(|| {
                SitemapError::DataSource(format!("page offset overflowed after {processed} rows"))
            })?;

            let elapsed = started.elapsed();
            debug!(
                offset,
                processed,
                total_rows,
                elapsed_ms = elapsed.as_millis() as u64,
                "page processed"
            );
            self.progress.page_done(processed, total_rows, elapsed);
        }

        if !pending.is_empty() {
            segments.push(self.seal(&mut pending).await?);
        }

        self.progress.finished(processed);
        info!(processed, segments = segments.len(), "export complete");

        Ok(ExportSummary {
            segments,
            total_rows,
            rows_exported: processed,
        })
    }

    async fn seal(&self, pending: &mut PendingSegment) -> Result<SealedSegment> {
        let (index, records) = pending.take();
        let filename = company_segment_name(index);
        self.write_segment(&filename, &records).await?;
        info!(file = %filename, urls = records.len(), "sealed segment");
        self.progress.segment_sealed(&filename, records.len());
        Ok(SealedSegment {
            filename,
            urls: records.len(),
        })
    }

    async fn write_segment(&self, filename: &str, records: &[UrlRecord]) -> Result<PathBuf> {
        let path = self.output_dir.join(filename);
        let body = xml::render_urlset(records)?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| SitemapError::io(&path, e))?;
        Ok(path)
    }
}
