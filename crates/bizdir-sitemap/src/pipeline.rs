//! One generation run: prepare the output directory, export every segment,
//! then write the manifest and pointer.
//!
//! Any failure aborts the run before the index step, so a directory without a
//! fresh `sitemap-index.xml` is always the sign of an incomplete run.

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::exporter::{ExportProgress, SealedSegment, SegmentedExporter};
use crate::index::write_index;
use crate::source::CompanySource;
use crate::workspace::prepare_output_dir;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// What a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// Every segment file, static first, then numbered in index order.
    pub segments: Vec<SealedSegment>,
    /// Row count reported by the source.
    pub total_rows: u64,
    /// Company URLs written across all numbered segments.
    pub company_urls: u64,
    pub stale_files_removed: usize,
    pub manifest: PathBuf,
    pub pointer: PathBuf,
    pub generated_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl GenerationReport {
    /// Segment filenames in manifest order.
    pub fn filenames(&self) -> Vec<String> {
        self.segments.iter().map(|s| s.filename.clone()).collect()
    }

    /// Number of segment files, including the static one.
    pub fn file_count(&self) -> usize {
        self.segments.len()
    }
}

fn serialize_millis<S>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_u64(d.as_millis() as u64)
}

/// Run the full pipeline with the current time as the run clock.
pub async fn generate(
    config: &GeneratorConfig,
    source: &mut dyn CompanySource,
    progress: &dyn ExportProgress,
) -> Result<GenerationReport> {
    generate_at(config, source, progress, Utc::now()).await
}

/// Run the full pipeline with an explicit run clock.
///
/// `generated_at` is the `<lastmod>` of every manifest entry and of every
/// company without a registration date, so a fixed value makes output
/// reproducible.
pub async fn generate_at(
    config: &GeneratorConfig,
    source: &mut dyn CompanySource,
    progress: &dyn ExportProgress,
    generated_at: DateTime<Utc>,
) -> Result<GenerationReport> {
    config.validate()?;
    let site = config.site()?;
    let started = Instant::now();

    let stale_files_removed = prepare_output_dir(&config.output_dir).await?;

    let exporter = SegmentedExporter::new(config, &site, generated_at).with_progress(progress);
    let static_segment = exporter.write_static(&config.static_entries).await?;
    let summary = exporter.export(source).await?;

    let company_urls: u64 = summary.segments.iter().map(|s| s.urls as u64).sum();
    let mut segments = Vec::with_capacity(summary.segments.len() + 1);
    segments.push(static_segment);
    segments.extend(summary.segments);

    let filenames: Vec<String> = segments.iter().map(|s| s.filename.clone()).collect();
    let files = write_index(
        &config.output_dir,
        &config.pointer_path,
        &filenames,
        &site,
        generated_at,
    )
    .await?;

    let elapsed = started.elapsed();
    info!(
        files = segments.len(),
        company_urls,
        elapsed_ms = elapsed.as_millis() as u64,
        "sitemap generation complete"
    );

    Ok(GenerationReport {
        segments,
        total_rows: summary.total_rows,
        company_urls,
        stale_files_removed,
        manifest: files.manifest,
        pointer: files.pointer,
        generated_at,
        elapsed,
    })
}
