//! `bizdir-sitemap generate`: export every company into sitemap segments.

use crate::cli::output::{self, Styled};
use crate::cli::progress::ScanProgress;
use crate::config::GeneratorConfig;
use crate::pipeline::{self, GenerationReport};
use crate::source::{SqliteSource, TableSpec};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, warn};

/// Run the generate command.
pub async fn run(config: &GeneratorConfig, database: &Path, table: TableSpec) -> Result<()> {
    let s = Styled::new();

    if !output::is_quiet() && !output::is_json() {
        output::print_header(&s);
        eprintln!("  Generating sitemaps for {}", s.bold(&config.base_url));
        eprintln!("  Source:  {}", database.display());
        eprintln!("  Output:  {}", config.output_dir.display());
        eprintln!();
    }

    let mut source = SqliteSource::open(database, table)
        .with_context(|| format!("failed to open company database {}", database.display()))?;
    info!(database = %database.display(), "opened company database");

    let progress = ScanProgress::new();
    let result = pipeline::generate(config, &mut source, &progress).await;
    let report = settle(result, source.close(), "sitemap generation failed")?;

    if output::is_json() {
        output::print_json(&serde_json::to_value(&report)?);
        return Ok(());
    }

    if !output::is_quiet() {
        print_report(&s, &report);
    }
    Ok(())
}

/// Combine a run's result with the outcome of closing its source.
///
/// The run's own error wins; a close failure only surfaces after a
/// successful run.
pub(crate) fn settle<T>(
    result: crate::Result<T>,
    closed: crate::Result<()>,
    failed: &'static str,
) -> Result<T> {
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e).context("failed to close company database"),
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                warn!(error = %close_err, "failed to close company database");
            }
            Err(e).context(failed)
        }
    }
}

/// Print the files produced and a summary of the run.
fn print_report(s: &Styled, report: &GenerationReport) {
    eprintln!(
        "  {} Generated {} sitemap files:",
        s.ok_sym(),
        report.file_count()
    );
    for name in report.filenames() {
        println!("{name}");
    }
    eprintln!();
    eprintln!(
        "  Companies: {} of {} rows",
        output::format_count(report.company_urls),
        output::format_count(report.total_rows)
    );
    eprintln!("  Manifest:  {}", report.manifest.display());
    eprintln!("  Pointer:   {}", report.pointer.display());

    if output::is_verbose() {
        let bytes: u64 = report
            .segments
            .iter()
            .filter_map(|seg| report.manifest.parent().map(|dir| dir.join(&seg.filename)))
            .filter_map(|path| path.metadata().ok())
            .map(|meta| meta.len())
            .sum();
        eprintln!("  Size:      {}", output::format_size(bytes));
        eprintln!("  Removed:   {} stale file(s)", report.stale_files_removed);
    }

    eprintln!();
    eprintln!("  Total time: {}", output::format_elapsed(report.elapsed));
}
